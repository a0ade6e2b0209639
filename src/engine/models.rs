use std::path::{Component, Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::{DeError, Reader};
use serde::Deserialize;
use serde::de::Error as _;

use crate::error::{PatchError, Result};

const ROOT_ELEMENT: &str = "filelist";

/// A single entry of the remote file list.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    #[serde(rename = "@name")]
    pub name: String,
    /// Expected CRC-32, empty when the file is not verified.
    #[serde(rename = "@crc", default)]
    pub crc: String,
    #[serde(rename = "@showDialog", default)]
    pub show_dialog: String,
    #[serde(rename = "@restartRequired", default)]
    pub restart_required: String,
    #[serde(rename = "link", default)]
    pub links: Vec<String>,
}

impl FileRecord {
    /// First download link starting with `scheme`.
    pub fn link_with_scheme(&self, scheme: &str) -> Option<&str> {
        self.links
            .iter()
            .map(|link| link.trim())
            .find(|link| link.starts_with(scheme))
    }

    pub fn restart_required(&self) -> bool {
        flag_set(&self.restart_required)
    }

    /// Whether the launcher should tell the player this file changed.
    pub fn shows_dialog(&self) -> bool {
        flag_set(&self.show_dialog)
    }

    /// The entry name as a path that stays inside the pod directory.
    pub fn relative_path(&self) -> Result<PathBuf> {
        let path = Path::new(&self.name);
        let mut out = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(PatchError::UnsafeEntry {
                        name: self.name.clone(),
                    });
                }
            }
        }
        if out.as_os_str().is_empty() {
            return Err(PatchError::UnsafeEntry {
                name: self.name.clone(),
            });
        }
        Ok(out)
    }
}

/// The remote file list, in document order.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename = "filelist")]
pub struct Manifest {
    #[serde(rename = "file", default)]
    pub files: Vec<FileRecord>,
}

impl Manifest {
    /// Decode a `<filelist>` document. Any other root element is rejected.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = root_element(xml)?;
        if root != ROOT_ELEMENT {
            return Err(DeError::custom(format!(
                "expected element type <{ROOT_ELEMENT}> but have <{root}>"
            ))
            .into());
        }
        Ok(quick_xml::de::from_str(xml)?)
    }
}

fn root_element(xml: &str) -> Result<String, DeError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(tag) | Event::Empty(tag) => {
                return Ok(String::from_utf8_lossy(tag.name().as_ref()).into_owned());
            }
            Event::Eof => return Err(DeError::custom("document has no root element")),
            _ => {}
        }
    }
}

fn flag_set(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SECURE_SCHEME;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<filelist>
  <file name="Path of Diablo Launcher.exe" crc="1A2B3C4D" showDialog="false" restartRequired="true">
    <link>http://mirror.example/launcher.exe</link>
    <link>https://mirror.example/launcher.exe</link>
  </file>
  <file name="data/global/excel/Armor.txt" crc="">
    <link>https://mirror.example/Armor.txt</link>
  </file>
</filelist>"#;

    #[test]
    fn parses_records_in_document_order() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.files.len(), 2);

        let launcher = &manifest.files[0];
        assert_eq!(launcher.name, "Path of Diablo Launcher.exe");
        assert_eq!(launcher.crc, "1A2B3C4D");
        assert_eq!(launcher.show_dialog, "false");
        assert!(!launcher.shows_dialog());
        assert!(launcher.restart_required());
        assert_eq!(launcher.links.len(), 2);

        let armor = &manifest.files[1];
        assert_eq!(armor.crc, "");
        assert!(!armor.restart_required());
    }

    #[test]
    fn optional_attributes_default_to_empty() {
        let manifest =
            Manifest::parse(r#"<filelist><file name="a.txt"><link>https://x/a.txt</link></file></filelist>"#)
                .unwrap();
        let record = &manifest.files[0];
        assert_eq!(record.crc, "");
        assert_eq!(record.show_dialog, "");
        assert_eq!(record.restart_required, "");
    }

    #[test]
    fn keeps_duplicate_names() {
        let manifest = Manifest::parse(
            r#"<filelist><file name="a.txt"/><file name="a.txt"/></filelist>"#,
        )
        .unwrap();
        assert_eq!(manifest.files.len(), 2);
        assert!(manifest.files[0].links.is_empty());
    }

    #[test]
    fn rejects_missing_name_and_broken_markup() {
        let missing_name = Manifest::parse(r#"<filelist><file crc="AB"/></filelist>"#);
        assert!(matches!(missing_name, Err(PatchError::Parse(_))));

        let broken = Manifest::parse("<filelist><file name=\"a\"></filelist>");
        assert!(matches!(broken, Err(PatchError::Parse(_))));
    }

    #[test]
    fn rejects_documents_that_are_not_file_lists() {
        for doc in [
            "<html><body><file name=\"x\"/></body></html>",
            "<html><head><title>Captive portal</title></head></html>",
            "<error>rate limited</error>",
            "<?xml version=\"1.0\"?><!-- empty -->",
            "404: Not Found",
        ] {
            assert!(
                matches!(Manifest::parse(doc), Err(PatchError::Parse(_))),
                "{doc} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_empty_file_list() {
        let manifest = Manifest::parse("<?xml version=\"1.0\"?>\n<filelist/>").unwrap();
        assert!(manifest.files.is_empty());
    }

    #[test]
    fn picks_first_https_link() {
        let record = FileRecord {
            name: "a.txt".into(),
            crc: String::new(),
            show_dialog: String::new(),
            restart_required: String::new(),
            links: vec![
                "http://plain/a.txt".into(),
                " https://first/a.txt ".into(),
                "https://second/a.txt".into(),
            ],
        };
        assert_eq!(
            record.link_with_scheme(SECURE_SCHEME),
            Some("https://first/a.txt")
        );

        let plain_only = FileRecord {
            links: vec!["http://plain/a.txt".into()],
            ..record
        };
        assert_eq!(plain_only.link_with_scheme(SECURE_SCHEME), None);
    }

    #[test]
    fn relative_path_stays_inside_root() {
        let mut record = FileRecord {
            name: "data/./a.txt".into(),
            crc: String::new(),
            show_dialog: String::new(),
            restart_required: String::new(),
            links: Vec::new(),
        };
        assert_eq!(record.relative_path().unwrap(), PathBuf::from("data/a.txt"));

        for name in ["../outside.txt", "/etc/passwd", "data/../../x", ""] {
            record.name = name.into();
            assert!(
                matches!(record.relative_path(), Err(PatchError::UnsafeEntry { .. })),
                "{name} should be rejected"
            );
        }
    }
}
