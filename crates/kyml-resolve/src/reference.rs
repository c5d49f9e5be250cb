/// Strip any `@digest` and `:tag` suffix from an image reference, leaving the
/// repository name.
///
/// A colon only starts a tag when it comes after the last `/`, so registry
/// ports (`registry:5000/path/hello`) survive.
pub fn strip_tag_and_digest(image: &str) -> &str {
    let image = match image.find('@') {
        Some(at) => &image[..at],
        None => image,
    };
    match (image.rfind(':'), image.rfind('/')) {
        (Some(colon), Some(slash)) if colon > slash => &image[..colon],
        (Some(colon), None) => &image[..colon],
        _ => image,
    }
}
