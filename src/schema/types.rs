/// Type table for `cast`
/// Maps the short type names accepted by the builder onto Arrow data types
use crate::error::{AssemblyError, AssemblyResult};
use arrow::datatypes::{DataType, TimeUnit};

/// Resolve a type name from the fixed table
pub fn resolve_type(field: &str, type_name: &str) -> AssemblyResult<DataType> {
    let data_type = match type_name.trim().to_ascii_lowercase().as_str() {
        "int" | "integer" => DataType::Int32,
        "long" => DataType::Int64,
        "short" => DataType::Int16,
        "byte" => DataType::Int8,
        "float" => DataType::Float32,
        "double" => DataType::Float64,
        "string" => DataType::Utf8,
        "boolean" | "bool" => DataType::Boolean,
        "date" => DataType::Date32,
        "timestamp" => DataType::Timestamp(TimeUnit::Millisecond, None),
        _ => {
            return Err(AssemblyError::UnknownType {
                field: field.to_string(),
                type_name: type_name.to_string(),
            })
        }
    };
    Ok(data_type)
}
