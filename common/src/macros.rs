/// Build a `PathBuf` out of a list of path components.
///
/// ```
/// use std::path::PathBuf;
/// use wxplace_common::makepath;
///
/// let p: PathBuf = makepath!("/etc", "wxplace", "wxplace.hcl");
/// assert_eq!(PathBuf::from("/etc/wxplace/wxplace.hcl"), p);
/// ```
///
#[macro_export]
macro_rules! makepath {
    ($($item:expr),+ $(,)?) => {
        [$(::std::path::PathBuf::from($item),)+]
            .iter()
            .collect::<::std::path::PathBuf>()
    };
}
