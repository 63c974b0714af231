use super::{encode, walk};
use crate::{
    core::data::Data,
    ports::serializer::{SerializationResult, SerializerAdapter},
};

/// `json_group_encode`: objects answer through their group capability with the
/// active groups, falling back to the plain capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGroupEncodeSerializerAdapter;

impl JsonGroupEncodeSerializerAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SerializerAdapter for JsonGroupEncodeSerializerAdapter {
    fn serialize(&self, data: &Data, groups: Option<&[String]>) -> SerializationResult<String> {
        let groups = groups.unwrap_or_default();
        let value = walk(data, &|object| {
            object
                .json_group_serialize(groups)
                .or_else(|| object.json_serialize())
        })?;
        encode(&value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use super::*;
    use crate::{
        adapters::serializers::fixtures::{Category, Opaque, Wrapper},
        core::data::Serializable,
    };

    fn render(data: &Data, groups: &[&str]) -> Value {
        let groups: Vec<String> = groups.iter().map(|g| g.to_string()).collect();
        let text = JsonGroupEncodeSerializerAdapter::new()
            .serialize(data, Some(&groups))
            .unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(render(&Data::from("plain"), &[]), json!("plain"));
        assert_eq!(render(&Data::from(7), &["any"]), json!(7));
        assert_eq!(render(&Data::Null, &[]), Value::Null);
    }

    #[test]
    fn groups_select_fields() {
        let data = Data::object(Category::tree());

        assert_eq!(render(&data, &[]), json!({"id": 42, "name": "foobar"}));
        assert_eq!(
            render(&data, &["relationships"]),
            json!({"id": 42, "name": "foobar", "parent": 42, "children": [42, 42]})
        );
    }

    #[test]
    fn falls_back_to_plain_capability() {
        #[derive(Debug)]
        struct PlainOnly;

        impl Serializable for PlainOnly {
            fn json_serialize(&self) -> Option<Data> {
                Some(Data::map([("plain", true)]))
            }
        }

        assert_eq!(render(&Data::object(PlainOnly), &["x"]), json!({"plain": true}));
    }

    #[test]
    fn nested_objects_are_walked_again() {
        let data = Data::object(Wrapper(Arc::new(Category::leaf())));
        assert_eq!(
            render(&data, &[]),
            json!({"inner": {"id": 42, "name": "foobar"}})
        );
    }

    #[test]
    fn non_serializable_object_is_empty_object() {
        assert_eq!(render(&Data::object(Opaque), &["relationships"]), json!({}));
    }

    #[test]
    fn absent_groups_behave_as_empty() {
        let text = JsonGroupEncodeSerializerAdapter
            .serialize(&Data::object(Category::tree()), None)
            .unwrap();
        assert_eq!(text, r#"{"id":42,"name":"foobar"}"#);
    }
}
