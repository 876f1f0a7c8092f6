mod model;
mod repository;

pub use model::ClusterCurrencyRateDB;
pub use repository::ClusterCurrencyRepository;
