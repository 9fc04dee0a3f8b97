//! Projection schemas: which flat fields are read from a property record
//!
//! A schema is an ordered list of output fields. Most fields are looked up
//! below a *scope anchor*, a named substructure of the `BIE` record such as
//! the address (`DIR`) or the cadastral reference (`RCA`). A few fields are
//! concatenations of other fields.
//!
//! Two schema versions exist and their field lists are not interchangeable:
//!
//! | Version | Fields | Dedup by default |
//! |---------|--------|------------------|
//! | [`SchemaVersion::Legacy`] | 19 | yes |
//! | [`SchemaVersion::Extended`] | 28 | no |

use serde::{Deserialize, Serialize};

/// Named substructure of a record that lookups are relative to
///
/// Each anchor is found by first match below the record, step by step along
/// its path. When a record holds several occurrences (several addressable
/// units, say) only the first is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Cadastral reference (`RCA`)
    Reference,
    /// Postal address (`DIR`)
    Address,
    /// Location inside the building (`LOINT`)
    UnitLocation,
    /// Rural polygon and parcel (`CPP`)
    Parcel,
    /// First construction element (`LEC` → `ELC`)
    ConstructionElement,
    /// Economic descriptor of the property (`DEBI`)
    CadastralDescriptor,
}

impl Scope {
    /// Every scope, in declaration order
    pub const ALL: [Self; 6] = [
        Self::Reference,
        Self::Address,
        Self::UnitLocation,
        Self::Parcel,
        Self::ConstructionElement,
        Self::CadastralDescriptor,
    ];

    /// Element names walked, first match each step, to reach the anchor
    #[must_use]
    pub const fn anchor_path(self) -> &'static [&'static str] {
        match self {
            Self::Reference => &["RCA"],
            Self::Address => &["DIR"],
            Self::UnitLocation => &["LOINT"],
            Self::Parcel => &["CPP"],
            Self::ConstructionElement => &["LEC", "ELC"],
            Self::CadastralDescriptor => &["DEBI"],
        }
    }

    /// Position in [`Scope::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.anchor_path().join("/"))
    }
}

/// How the value of one output field is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRule {
    /// Trimmed text of the first `tag` element below the scope anchor
    Lookup {
        /// Anchor the lookup is relative to
        scope: Scope,
        /// Local name of the element holding the value
        tag: &'static str,
    },
    /// String concatenation of other lookup fields, in order
    Concat(&'static [&'static str]),
}

/// One output column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    /// Column name
    pub name: &'static str,
    /// Extraction rule
    pub rule: FieldRule,
}

const fn lookup(scope: Scope, tag: &'static str) -> FieldSpec {
    FieldSpec {
        name: tag,
        rule: FieldRule::Lookup { scope, tag },
    }
}

/// Components of the cadastral reference, in reference order
const REFERENCE_PARTS: &[&str] = &["PCA", "CAR", "CDC1", "CDC2"];

const RC: FieldSpec = FieldSpec {
    name: "RC",
    rule: FieldRule::Concat(REFERENCE_PARTS),
};

const LEGACY_FIELDS: &[FieldSpec] = &[
    lookup(Scope::Address, "TV"),
    lookup(Scope::Address, "NV"),
    lookup(Scope::Address, "PNP"),
    lookup(Scope::Address, "PLP"),
    lookup(Scope::Address, "BQ"),
    lookup(Scope::UnitLocation, "ES"),
    lookup(Scope::UnitLocation, "PT"),
    lookup(Scope::UnitLocation, "PU"),
    RC,
    lookup(Scope::Reference, "PCA"),
    lookup(Scope::Reference, "CAR"),
    lookup(Scope::Reference, "CDC1"),
    lookup(Scope::Reference, "CDC2"),
    lookup(Scope::Parcel, "CPO"),
    lookup(Scope::Parcel, "CPA"),
    lookup(Scope::Address, "KM"),
    lookup(Scope::ConstructionElement, "ESC"),
    lookup(Scope::ConstructionElement, "PLA"),
    lookup(Scope::ConstructionElement, "PUE"),
];

const EXTENDED_FIELDS: &[FieldSpec] = &[
    lookup(Scope::Address, "TV"),
    lookup(Scope::Address, "NV"),
    lookup(Scope::Address, "PNP"),
    lookup(Scope::Address, "PLP"),
    lookup(Scope::Address, "SNP"),
    lookup(Scope::Address, "SLP"),
    lookup(Scope::Address, "BQ"),
    lookup(Scope::Address, "KM"),
    lookup(Scope::Address, "DP"),
    lookup(Scope::UnitLocation, "ES"),
    lookup(Scope::UnitLocation, "PT"),
    lookup(Scope::UnitLocation, "PU"),
    RC,
    lookup(Scope::Reference, "PCA"),
    lookup(Scope::Reference, "CAR"),
    lookup(Scope::Reference, "CDC1"),
    lookup(Scope::Reference, "CDC2"),
    lookup(Scope::Parcel, "CPO"),
    lookup(Scope::Parcel, "CPA"),
    lookup(Scope::ConstructionElement, "ESC"),
    lookup(Scope::ConstructionElement, "PLA"),
    lookup(Scope::ConstructionElement, "PUE"),
    lookup(Scope::ConstructionElement, "LCD"),
    lookup(Scope::ConstructionElement, "STL"),
    lookup(Scope::CadastralDescriptor, "LUSO"),
    lookup(Scope::CadastralDescriptor, "SFC"),
    lookup(Scope::CadastralDescriptor, "CPT"),
    lookup(Scope::CadastralDescriptor, "ANT"),
];

/// Named schema version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Address, location, reference, parcel and stair/floor/door columns;
    /// records are deduplicated on the cadastral reference
    #[default]
    Legacy,
    /// Legacy columns plus secondary numbering, postal code, construction
    /// use/surface and the economic descriptor; no dedup by default
    Extended,
}

impl SchemaVersion {
    /// Every version
    pub const ALL: [Self; 2] = [Self::Legacy, Self::Extended];

    /// The projection schema of this version
    #[must_use]
    pub const fn schema(self) -> &'static ProjectionSchema {
        match self {
            Self::Legacy => &LEGACY,
            Self::Extended => &EXTENDED,
        }
    }

    /// Lower-case name used on the command line and in config files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Extended => "extended",
        }
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" | "v1" => Ok(Self::Legacy),
            "extended" | "v2" => Ok(Self::Extended),
            _ => Err(format!("Unknown schema '{s}'. Expected: legacy, extended")),
        }
    }
}

/// A fixed, ordered projection from a property record to flat fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectionSchema {
    /// Version this schema implements
    pub version: SchemaVersion,
    /// Local name of record elements, searched anywhere below the document root
    pub record_tag: &'static str,
    /// Output fields in column order
    pub fields: &'static [FieldSpec],
    /// Fields whose concatenation identifies a property
    pub dedup_key: &'static [&'static str],
    /// Whether collectors drop repeated keys unless told otherwise
    pub dedup_by_default: bool,
}

/// Legacy (19-field) schema
pub const LEGACY: ProjectionSchema = ProjectionSchema {
    version: SchemaVersion::Legacy,
    record_tag: "BIE",
    fields: LEGACY_FIELDS,
    dedup_key: REFERENCE_PARTS,
    dedup_by_default: true,
};

/// Extended (28-field) schema
pub const EXTENDED: ProjectionSchema = ProjectionSchema {
    version: SchemaVersion::Extended,
    record_tag: "BIE",
    fields: EXTENDED_FIELDS,
    dedup_key: REFERENCE_PARTS,
    dedup_by_default: false,
};

impl ProjectionSchema {
    /// Column names in order
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Number of output columns
    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no columns
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column position of `name`
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
