//! Merge strategies for resolving insert collisions
//!
//! An insert calls its merge function at every leaf the network terminates
//! at, passing the value currently stored there. These helpers build the
//! common resolvers; any closure with the same shape works in their place,
//! and returning `Err` from one aborts the insert with the message carried
//! through unchanged.

use mmdbforge_data::DataValue;

/// Replace whatever is stored with `value`.
pub fn replace_with(
    value: DataValue,
) -> impl Fn(Option<DataValue>) -> Result<Option<DataValue>, String> {
    move |_| Ok(Some(value.clone()))
}

/// Remove any stored value, leaving the leaf empty.
pub fn remove() -> impl Fn(Option<DataValue>) -> Result<Option<DataValue>, String> {
    |_| Ok(None)
}

/// Merge `value` over the stored value one level deep: when both are maps,
/// keys present in `value` win and other stored keys are kept. Any other
/// combination is replaced by `value`.
pub fn top_level_merge_with(
    value: DataValue,
) -> impl Fn(Option<DataValue>) -> Result<Option<DataValue>, String> {
    move |existing| match (existing, value.clone()) {
        (Some(DataValue::Map(mut current)), DataValue::Map(incoming)) => {
            for (key, new) in incoming {
                current.insert(key, new);
            }
            Ok(Some(DataValue::Map(current)))
        }
        (_, incoming) => Ok(Some(incoming)),
    }
}

/// Merge `value` over the stored value recursively: maps merge key-wise,
/// arrays merge index-wise (the longer array's tail is kept), and any other
/// combination is replaced by the incoming side.
pub fn deep_merge_with(
    value: DataValue,
) -> impl Fn(Option<DataValue>) -> Result<Option<DataValue>, String> {
    move |existing| match existing {
        Some(current) => Ok(Some(deep_merge(current, value.clone()))),
        None => Ok(Some(value.clone())),
    }
}

fn deep_merge(current: DataValue, incoming: DataValue) -> DataValue {
    match (current, incoming) {
        (DataValue::Map(mut current), DataValue::Map(incoming)) => {
            for (key, new) in incoming {
                let merged = match current.remove(&key) {
                    Some(old) => deep_merge(old, new),
                    None => new,
                };
                current.insert(key, merged);
            }
            DataValue::Map(current)
        }
        (DataValue::Array(current), DataValue::Array(incoming)) => {
            let mut merged = Vec::with_capacity(current.len().max(incoming.len()));
            let mut current = current.into_iter();
            let mut incoming = incoming.into_iter();
            loop {
                match (current.next(), incoming.next()) {
                    (Some(old), Some(new)) => merged.push(deep_merge(old, new)),
                    (Some(old), None) => merged.push(old),
                    (None, Some(new)) => merged.push(new),
                    (None, None) => break,
                }
            }
            DataValue::Array(merged)
        }
        (_, incoming) => incoming,
    }
}
