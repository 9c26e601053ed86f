//! Fixed catalogs: protobuf tag-range constants, scalar type names, and the
//! well-known Google types importable without a local declaration.

/// Smallest legal field tag.
pub const MIN_TAG_VALUE: i32 = 1;
/// Largest legal field tag (2^29 - 1).
pub const MAX_TAG_VALUE: i32 = (1 << 29) - 1;
/// First tag of the range protobuf reserves for its own implementation.
pub const RESERVED_TAG_VALUE_START: i32 = 19000;
/// Last tag of the reserved implementation range.
pub const RESERVED_TAG_VALUE_END: i32 = 19999;

/// True if `tag` is inside the valid range and outside the reserved
/// implementation range.
pub fn is_tag_allowed(tag: i32) -> bool {
    (MIN_TAG_VALUE..=MAX_TAG_VALUE).contains(&tag)
        && !(RESERVED_TAG_VALUE_START..=RESERVED_TAG_VALUE_END).contains(&tag)
}

/// True if `name` is one of the protobuf scalar types.
pub fn is_scalar_type(name: &str) -> bool {
    matches!(
        name,
        "double"
            | "float"
            | "int32"
            | "int64"
            | "uint32"
            | "uint64"
            | "sint32"
            | "sint64"
            | "fixed32"
            | "fixed64"
            | "sfixed32"
            | "sfixed64"
            | "bool"
            | "string"
            | "bytes"
    )
}

/// Types provided by `google/protobuf/*.proto`.
const GOOGLE_PROTOBUF_TYPES: &[&str] = &[
    "Any",
    "Api",
    "BoolValue",
    "BytesValue",
    "DoubleValue",
    "Duration",
    "Empty",
    "Enum",
    "EnumValue",
    "Field",
    "FieldMask",
    "FloatValue",
    "Int32Value",
    "Int64Value",
    "ListValue",
    "Method",
    "Mixin",
    "NullValue",
    "Option",
    "SourceContext",
    "StringValue",
    "Struct",
    "Timestamp",
    "Type",
    "UInt32Value",
    "UInt64Value",
    "Value",
];

/// Types provided by `google/type/*.proto`.
const GOOGLE_TYPE_TYPES: &[&str] = &[
    "CalendarPeriod",
    "Color",
    "Date",
    "DateTime",
    "DayOfWeek",
    "Decimal",
    "Expr",
    "Fraction",
    "Interval",
    "LatLng",
    "Money",
    "Month",
    "PhoneNumber",
    "PostalAddress",
    "Quaternion",
    "TimeOfDay",
    "TimeZone",
];

/// True if `name` refers to a well-known Google type, in qualified
/// (`google.protobuf.Timestamp`, `.google.type.Date`) or bare
/// (`Timestamp`) form.
pub fn is_well_known_type(name: &str) -> bool {
    let name = name.strip_prefix('.').unwrap_or(name);
    if let Some(simple) = name.strip_prefix("google.protobuf.") {
        return GOOGLE_PROTOBUF_TYPES.contains(&simple);
    }
    if let Some(simple) = name.strip_prefix("google.type.") {
        return GOOGLE_TYPE_TYPES.contains(&simple);
    }
    GOOGLE_PROTOBUF_TYPES.contains(&name) || GOOGLE_TYPE_TYPES.contains(&name)
}
