//! Shared fixtures for unit tests.

use serde::{Deserialize, Serialize};

use crate::definition::ServiceDefinition;

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Size {
    #[prost(int32, tag = "1")]
    pub inches: i32,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Hat {
    #[prost(int32, tag = "1")]
    pub inches: i32,
    #[prost(string, tag = "2")]
    pub color: String,
    #[prost(string, tag = "3")]
    pub name: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct HatList {
    #[prost(message, repeated, tag = "1")]
    pub hats: Vec<Hat>,
}

pub fn haberdasher() -> ServiceDefinition {
    ServiceDefinition::new("example", "Haberdasher")
        .rpc::<Size, Hat>("MakeHat", "make_hat")
        .rpc::<Size, HatList>("ListHats", "list_hats")
}
