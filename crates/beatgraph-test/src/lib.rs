#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod mock;

pub use mock::{
    FailingGraphStore, InMemoryGraphStore, MOCK_ASSET_BASE_URL, MockJobConfig, MockJobProvider,
    create_mock_services,
};
