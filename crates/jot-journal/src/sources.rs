//! Fixed-list collaborators for configuration-driven use and tests.

use std::convert::Infallible;

use jot_core::{
  entity::name_key,
  store::{ContactSource, PlaceResult, PlaceSearch},
};

/// A contact source backed by a fixed list of display names.
#[derive(Debug, Clone, Default)]
pub struct StaticContacts(pub Vec<String>);

impl ContactSource for StaticContacts {
  type Error = Infallible;

  async fn list_contacts(&self) -> Result<Vec<String>, Infallible> {
    Ok(self.0.clone())
  }
}

/// Place search over a fixed gazetteer: case-insensitive substring match on
/// the place name, in list order.
#[derive(Debug, Clone, Default)]
pub struct StaticPlaceSearch {
  places: Vec<PlaceResult>,
}

impl StaticPlaceSearch {
  pub fn new(places: Vec<PlaceResult>) -> Self { Self { places } }
}

impl PlaceSearch for StaticPlaceSearch {
  type Error = Infallible;

  async fn search(&self, query: &str) -> Result<Vec<PlaceResult>, Infallible> {
    let query = name_key(query.trim());
    if query.is_empty() {
      return Ok(Vec::new());
    }
    Ok(
      self
        .places
        .iter()
        .filter(|p| name_key(&p.name).contains(&query))
        .cloned()
        .collect(),
    )
  }
}
