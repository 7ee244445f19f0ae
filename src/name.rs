//! # Names
//!
//! Distinguished-name normalization and comparison, the `GeneralName`
//! CHOICE and its typed collection, and the name-constraints engine that
//! decides whether a candidate certificate's subject and subject
//! alternative names fall inside an issuer's permitted and excluded
//! subtrees.

mod constraints;
mod general_names;

pub(crate) mod normalize;

pub mod ip;

pub use self::{
    constraints::NameConstraints,
    general_names::{GeneralNames, IpAddressMode, name_types, parse_general_name},
    normalize::{find_email_addresses_in_name, normalize_name, verify_name_in_subtree},
};
