pub const DINO_RECEIVED: &str = "Dino received";

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Dinosaur {
    pub id: u64,
    pub status: String,
    #[serde(alias = "name", rename = "Dinosaurio")]
    pub name: String,
}

impl Dinosaur {
    pub fn received(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            status: DINO_RECEIVED.to_string(),
            name: name.into(),
        }
    }
}
