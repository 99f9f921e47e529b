use std::fmt;
use crate::LoadError;

/**
 * Deconstructed path to a file.
 */
#[derive(Clone, Eq, PartialEq, Default, Debug, Hash)]
pub struct AssetPath {
    pub protocol: String,
    pub prefix: Option<String>,
    pub body: String,
    pub extension: String,
}

impl AssetPath {

    pub fn parse(path: &str, default_protocol: Option<&str>) -> Result<Self, LoadError> {
        let protocol: Option<&str>;
        let mut remainder = path;

        // Reads protocol
        match remainder.split_once("://") {
            Some((left, right)) => {
                protocol = Some(left);
                remainder = right;
            },
            None => protocol = None,
        };
        let Some(protocol) = protocol.or(default_protocol) else {
            return Err(LoadError::NoDefaultProtocol)
        };

        // Reads body and extension from the last path segment only
        let remainder = normalize(remainder);
        let (directory, file_name) = match remainder.rsplit_once('/') {
            Some((directory, file_name)) => (Some(directory), file_name),
            None => (None, remainder.as_str()),
        };
        let Some((stem, extension)) = file_name.rsplit_once('.') else {
            return Err(LoadError::PathMissingExtension)
        };
        if stem.is_empty() || extension.is_empty() {
            return Err(LoadError::PathMissingExtension);
        }
        let body = match directory {
            Some(directory) => format!("{directory}/{stem}"),
            None => String::from(stem),
        };

        Ok(Self {
            protocol: protocol.into(),
            prefix: None,
            body,
            extension: extension.into()
        })
    }

    /// Body and extension. No protocol.
    pub fn without_protocol(&self) -> String {
        match self.prefix.as_deref() {
            Some(prefix) => format!("{}/{}.{}", prefix, self.body, self.extension),
            None => format!("{}.{}", self.body, self.extension),
        }
    }

    /// Parent directory of this file.
    /// None if it's at the root.
    pub fn parent(&self) -> Option<String> {
        self.body
            .rsplit_once('/')
            .map(|(parent, _)| String::from(parent))
    }
}

/// Collapses "." and "dir/.." segments.
/// Leading ".." segments that can't be collapsed are kept.
fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {},
            ".." => match segments.last() {
                Some(last) if *last != ".." => { segments.pop(); },
                _ => segments.push(".."),
            },
            _ => segments.push(segment),
        }
    }
    let joined = segments.join("/");
    if path.starts_with('/') { format!("/{joined}") } else { joined }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.without_protocol())
    }
}

/**
 * Wrapper for the hash of a path.
 */
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct PathHash(pub u64);
impl PathHash {
    pub fn of(path: &str) -> Self {
        Self(fxhash::hash64(path))
    }
}


#[cfg(test)]
mod test {
    use crate::{AssetPath, LoadError};

    #[test]
    fn parse_with_default_protocol() {
        let path = AssetPath::parse("tilesets/summer_rpg/summer_rpg_tiles.tsx", Some("file")).unwrap();
        assert_eq!("file", path.protocol);
        assert_eq!("tilesets/summer_rpg/summer_rpg_tiles", path.body);
        assert_eq!("tsx", path.extension);
        assert_eq!(Some(String::from("tilesets/summer_rpg")), path.parent());
    }

    #[test]
    fn parse_collapses_parent_segments() {
        let path = AssetPath::parse("raw://maps/../tilesets/./objects.tsx", None).unwrap();
        assert_eq!("raw", path.protocol);
        assert_eq!("tilesets/objects", path.body);
        assert_eq!("tilesets/objects.tsx", path.without_protocol());
        assert_eq!("raw://tilesets/objects.tsx", path.to_string());
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Err(LoadError::NoDefaultProtocol), AssetPath::parse("map.tmx", None));
        assert_eq!(Err(LoadError::PathMissingExtension), AssetPath::parse("file://maps/level", None));
        assert_eq!(Err(LoadError::PathMissingExtension), AssetPath::parse("file://maps.old/level", None));
    }

    #[test]
    fn root_has_no_parent() {
        let path = AssetPath::parse("level.tmx", Some("file")).unwrap();
        assert_eq!(None, path.parent());
    }
}
