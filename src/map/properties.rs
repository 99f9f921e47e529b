use roxmltree::Node;
use crate::HashMap;
use crate::map::{Color, TmxParseError};

/// Value of a custom property, typed the way Tiled writes it.
#[derive(Clone, PartialEq, Debug)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Color(Color),
    File(String),
    Object(u32),
}

/// Custom properties attached to a map, layer, tileset, tile or object.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {

    /// Parses the children of a <properties> node.
    pub fn parse(properties_node: Node) -> Result<Self, TmxParseError> {
        let mut properties = HashMap::default();
        for property_node in properties_node.children().filter(|node| node.has_tag_name("property")) {
            let mut name = None;
            let mut kind = "string";
            let mut value = None;
            for attribute in property_node.attributes() {
                match attribute.name() {
                    "name" => name = Some(attribute.value()),
                    "type" => kind = attribute.value(),
                    "value" => value = Some(attribute.value()),
                    _ => {}
                }
            }
            let name = name.ok_or(TmxParseError::MissingAttribute { name: String::from("name") })?;

            // Multi-line strings are stored as text instead of a value attribute
            let value = value.or(property_node.text()).unwrap_or("");
            let value = match kind {
                "string" => PropertyValue::String(String::from(value)),
                "int" => PropertyValue::Int(value.parse()?),
                "float" => PropertyValue::Float(value.parse()?),
                "bool" => PropertyValue::Bool(match value {
                    "true" => true,
                    "false" => false,
                    _ => return Err(TmxParseError::InvalidAttributeValue { value: String::from(value) }),
                }),
                "color" => PropertyValue::Color(Color::parse(value)?),
                "file" => PropertyValue::File(String::from(value)),
                "object" => PropertyValue::Object(value.parse()?),
                _ => return Err(TmxParseError::InvalidAttributeValue { value: String::from(kind) }),
            };
            properties.insert(String::from(name), value);
        }
        Ok(Self(properties))
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.0.get(name)? {
            PropertyValue::Float(value) => Some(*value),
            PropertyValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.0.get(name)? {
            PropertyValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}


#[cfg(test)]
mod test {
    use roxmltree::Document;
    use crate::map::{Color, Properties, PropertyValue, TmxParseError};

    fn parse(xml: &str) -> Result<Properties, TmxParseError> {
        let doc = Document::parse(xml)?;
        Properties::parse(doc.root_element())
    }

    #[test]
    fn typed_values() {
        let properties = parse(r##"<properties>
  <property name="label" value="Camp"/>
  <property name="count" type="int" value="-3"/>
  <property name="ratio" type="float" value="0.25"/>
  <property name="solid" type="bool" value="true"/>
  <property name="tint" type="color" value="#ff102030"/>
  <property name="music" type="file" value="audio/camp.ogg"/>
  <property name="target" type="object" value="12"/>
  <property name="notes">first line
second line</property>
 </properties>"##).unwrap();
        assert_eq!(8, properties.len());
        assert_eq!(Some(&PropertyValue::String(String::from("Camp"))), properties.get("label"));
        assert_eq!(Some(&PropertyValue::Int(-3)), properties.get("count"));
        assert_eq!(Some(-3.0), properties.get_float("count"));
        assert_eq!(Some(0.25), properties.get_float("ratio"));
        assert_eq!(Some(true), properties.get_bool("solid"));
        assert_eq!(Some(&PropertyValue::Color(Color::rgb(0x10, 0x20, 0x30))), properties.get("tint"));
        assert_eq!(Some(&PropertyValue::File(String::from("audio/camp.ogg"))), properties.get("music"));
        assert_eq!(Some(&PropertyValue::Object(12)), properties.get("target"));
        assert_eq!(Some(&PropertyValue::String(String::from("first line\nsecond line"))), properties.get("notes"));

        // Getters only match their own types
        assert_eq!(None, properties.get_bool("label"));
        assert_eq!(None, properties.get_float("solid"));
        assert_eq!(None, properties.get_float("missing"));
    }

    #[test]
    fn empty_properties() {
        let properties = parse("<properties/>").unwrap();
        assert!(properties.is_empty());
    }

    #[test]
    fn invalid_values() {
        let unknown_type = parse(r#"<properties><property name="a" type="vector" value="1"/></properties>"#);
        assert!(matches!(unknown_type, Err(TmxParseError::InvalidAttributeValue { value }) if value == "vector"));
        let bad_bool = parse(r#"<properties><property name="a" type="bool" value="yes"/></properties>"#);
        assert!(matches!(bad_bool, Err(TmxParseError::InvalidAttributeValue { value }) if value == "yes"));
        let bad_int = parse(r#"<properties><property name="a" type="int" value="1.5"/></properties>"#);
        assert!(matches!(bad_int, Err(TmxParseError::ParseIntError(_))));
        let unnamed = parse(r#"<properties><property value="1"/></properties>"#);
        assert!(matches!(unnamed, Err(TmxParseError::MissingAttribute { .. })));
    }
}
