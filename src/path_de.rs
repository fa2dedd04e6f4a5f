use serde::de::DeserializeOwned;

/// Deserialize a config file or type module, naming the JSON path of the
/// first offending value. Errors at the document root carry no path.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        if path == "." { inner.to_string() } else { format!("at JSON path {path}: {inner}") }
    })
}
