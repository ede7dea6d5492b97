//! Well-known vocabulary IRIs.

pub mod rdf {
    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

pub mod xsd {
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";

    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const NORMALIZED_STRING: &str = "http://www.w3.org/2001/XMLSchema#normalizedString";
    pub const TOKEN: &str = "http://www.w3.org/2001/XMLSchema#token";
    pub const ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";

    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";
    pub const SHORT: &str = "http://www.w3.org/2001/XMLSchema#short";
    pub const BYTE: &str = "http://www.w3.org/2001/XMLSchema#byte";
    pub const UNSIGNED_LONG: &str = "http://www.w3.org/2001/XMLSchema#unsignedLong";
    pub const UNSIGNED_INT: &str = "http://www.w3.org/2001/XMLSchema#unsignedInt";
    pub const UNSIGNED_SHORT: &str = "http://www.w3.org/2001/XMLSchema#unsignedShort";
    pub const UNSIGNED_BYTE: &str = "http://www.w3.org/2001/XMLSchema#unsignedByte";
    pub const NON_NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";
    pub const POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#positiveInteger";
    pub const NON_POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonPositiveInteger";
    pub const NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#negativeInteger";

    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const G_YEAR: &str = "http://www.w3.org/2001/XMLSchema#gYear";

    /// Every datatype derived from `xsd:integer`.
    pub const INTEGER_TYPES: &[&str] = &[
        INTEGER,
        LONG,
        INT,
        SHORT,
        BYTE,
        UNSIGNED_LONG,
        UNSIGNED_INT,
        UNSIGNED_SHORT,
        UNSIGNED_BYTE,
        NON_NEGATIVE_INTEGER,
        POSITIVE_INTEGER,
        NON_POSITIVE_INTEGER,
        NEGATIVE_INTEGER,
    ];

    /// Datatypes whose value space is a string.
    pub const STRING_TYPES: &[&str] = &[STRING, NORMALIZED_STRING, TOKEN];

    pub fn is_integer(datatype: &str) -> bool {
        INTEGER_TYPES.contains(&datatype)
    }

    pub fn is_string(datatype: &str) -> bool {
        STRING_TYPES.contains(&datatype)
    }
}

/// Namespaces bound in every prefix table unless overridden.
pub const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("rdf", rdf::NS),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", xsd::NS),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("schema", "http://schema.org/"),
    ("dbo", "http://dbpedia.org/ontology/"),
    ("dbp", "http://dbpedia.org/property/"),
    ("dbr", "http://dbpedia.org/resource/"),
];
