mod client;
mod dto;

pub use client::{LookupError, NutritionLookup, NutritionixClient};
