//! Serializers for CEDAR artifacts.
//!
//! - **JSON-LD** ([`jsonld`]): the pretty-printed document written to disk
//!   and submitted to the validator, plus the publish projection that strips
//!   identity and audit properties before an artifact is posted.

pub mod jsonld;
