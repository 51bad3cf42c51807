//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Comma-separated list of positive integers, e.g. `5,10,15`.
    ///
    /// `None` when the key is absent, `Some(Err(token))` naming the first
    /// token that is not a positive integer.
    fn get_usize_list(&self, section: &str, key: &str) -> Option<Result<Vec<usize>, String>> {
        let raw = self.get_string(section, key)?;
        Some(
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| match t.parse::<usize>() {
                    Ok(v) if v > 0 => Ok(v),
                    _ => Err(t.to_string()),
                })
                .collect(),
        )
    }
}
