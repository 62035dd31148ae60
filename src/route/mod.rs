pub mod docs;
pub mod model;
pub mod posts;
pub mod sitemap;
