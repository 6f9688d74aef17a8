use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IngestFileParams {
    #[schemars(description = "Path to the file to ingest (txt, md, or source code)")]
    pub path: String,

    #[schemars(description = "Collection to store into. Defaults to 'documents'.")]
    pub collection: Option<String>,

    #[schemars(description = "Extra metadata merged over the file's own metadata")]
    pub metadata: Option<BTreeMap<String, String>>,
}
