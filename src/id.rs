//! Code for handling IDs and index sets.
//!
//! Clusters are identified by name (e.g. an electoral constituency); suppliers, candidate sites,
//! postcode districts, products and vehicle types are integer-indexed, matching the input tables.

/// A time period (1-based, as in the demand table).
pub type Period = u32;

/// A demand scenario (1-based; the deterministic problem uses scenario 1 only).
pub type Scenario = u32;

macro_rules! define_id_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Clone, std::hash::Hash, PartialEq, Eq, serde::Deserialize, Debug, serde::Serialize,
        )]
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }
        }
    };
}

macro_rules! define_index_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Clone,
            Copy,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Debug,
            serde::Deserialize,
            serde::Serialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        pub struct $name(pub u32);

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                $name(value)
            }
        }
    };
}

define_id_type!(ClusterID, "The name of a demand cluster (e.g. a constituency)");

define_index_type!(SupplierID, "The index of a supplier");
define_index_type!(CandidateID, "The index of a candidate facility site");
define_index_type!(DistrictID, "The index of a postcode district (a demand point)");
define_index_type!(ProductID, "The index of a product group");
define_index_type!(VehicleType, "The index of a vehicle type");

impl CandidateID {
    /// The district a candidate site sits in.
    ///
    /// Candidate indices are district indices: a candidate's distances are looked up in the
    /// district rows/columns of the distance matrices.
    pub fn district(self) -> DistrictID {
        DistrictID(self.0)
    }
}
