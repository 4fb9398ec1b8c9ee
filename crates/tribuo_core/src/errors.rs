#[derive(Debug, thiserror::Error)]
pub enum ProtoConvError {
    #[error("Field is required: {0}")]
    RequiredField(String),

    #[error("Unknown class name on the wire: '{0}'")]
    UnknownClass(String),

    #[error(
        "Unsupported version {version} for {class_name}, this class supports at most version {ceiling}"
    )]
    UnsupportedVersion {
        class_name: String,
        version: i32,
        ceiling: i32,
    },

    #[error("Deserialized '{class_name}' does not match the requested type {expected}")]
    TypeMismatch {
        class_name: String,
        expected: &'static str,
    },

    #[error("Unknown enum variant for '{0}': '{1}'")]
    UnknownEnumVariant(&'static str, String),

    #[error("Duplicate wire field name '{name}' in the field list for {type_name}")]
    DuplicateFieldName {
        type_name: &'static str,
        name: &'static str,
    },

    #[error("Mismatched parallel field lengths for '{field}': {keys} keys, {values} values")]
    KeysValuesLength {
        field: String,
        keys: usize,
        values: usize,
    },

    #[error("Unexpected payload type for {class_name}: expected '{expected}', found '{found}'")]
    UnexpectedPayload {
        class_name: String,
        expected: String,
        found: String,
    },

    #[error("Invalid value for '{field}': {msg}")]
    InvalidValue { field: String, msg: String },

    #[error(transparent)]
    Decode(#[from] prost::DecodeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ProtoConvError> = std::result::Result<T, E>;

/// Extension for converting prost's optional message fields into
/// required domain fields.
pub trait FromOptionalField<T> {
    /// Consumes the option, erroring with the field name if empty.
    fn required(self, field: impl Into<String>) -> Result<T>;
}

impl<T> FromOptionalField<T> for Option<T> {
    fn required(self, field: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| ProtoConvError::RequiredField(field.into()))
    }
}
