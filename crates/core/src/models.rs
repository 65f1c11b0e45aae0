use serde::{Deserialize, Serialize};

/// Model entry from the provider's `/models` listing.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderModel {
    pub id: String,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub created: Option<u64>,
    #[serde(default)]
    pub owned_by: Option<String>,
}

/// Provider `/models` response.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderModelsResponse {
    pub data: Vec<ProviderModel>,
}

/// A model that can be picked for generation.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

/// Model listing returned to clients.
#[derive(Debug, Serialize, Clone)]
pub struct ModelsOutput {
    pub models: Vec<ModelInfo>,
}

/// Keep GPT chat models, drop `instruct` variants, sort by id.
pub fn filter_chat_models(models: Vec<ProviderModel>) -> ModelsOutput {
    let mut models: Vec<ModelInfo> = models
        .into_iter()
        .filter(|model| {
            let id = model.id.to_lowercase();
            id.contains("gpt") && !id.contains("instruct")
        })
        .map(|model| ModelInfo {
            name: model.id.clone(),
            id: model.id,
        })
        .collect();

    models.sort_by(|a, b| a.id.cmp(&b.id));

    ModelsOutput { models }
}
