/// Returns a cached value for `$key`, or awaits `$block`, stores its result
/// in the background with `$ttl` seconds to live, and returns it.
///
/// `$cache` must provide `get_from_cache` and `set_in_background`.
///
/// # Example
/// ```rust,ignore
/// let page = cached!(self.cache, CacheKey::Trending(1), 3600, async move {
///     self.fetch_trending(1).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
