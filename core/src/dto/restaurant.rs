use serde::Deserialize;

use super::Hydrate;

/// Where a review was written. The backend sends the restaurant as a bare
/// string, which becomes the location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Restaurant {
    pub location: String,
}

impl Hydrate for Restaurant {
    const ENTITY: &'static str = "restaurant";
}
