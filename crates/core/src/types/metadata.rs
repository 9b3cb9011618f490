use serde::Deserialize;

pub const DEFAULT_NAME: &str = "Untitled";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Raw JSON document as served by the metadata gateway. Every field is
/// optional; display fallbacks are applied when converting to
/// [`AuctionMetadata`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataDocument {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub thumbnail_uri: Option<String>,
    pub image_uris: Vec<String>,
}

/// Display-ready asset metadata with documented defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionMetadata {
    pub name: String,
    pub description: String,
    pub category: String,
    pub thumbnail_uri: Option<String>,
    pub image_uris: Vec<String>,
}

impl Default for AuctionMetadata {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            description: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            thumbnail_uri: None,
            image_uris: Vec::new(),
        }
    }
}

impl From<MetadataDocument> for AuctionMetadata {
    fn from(doc: MetadataDocument) -> Self {
        Self {
            name: doc
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            description: doc.description.unwrap_or_default(),
            category: doc
                .category
                .filter(|category| !category.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            thumbnail_uri: doc.thumbnail_uri,
            image_uris: doc.image_uris,
        }
    }
}
