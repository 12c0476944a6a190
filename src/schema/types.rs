//! Object types the operations return
use async_graphql::{
    dynamic::{Field, FieldFuture, FieldValue, Object, TypeRef},
    Name, Value,
};
use indexmap::IndexMap;

use crate::resource::field_name;

/// The result type of a resource that has no type of its own
pub const AUTHENTICATABLE: &str = "Authenticatable";
pub const CREDENTIALS: &str = "Credentials";

/// TypeDef
///
/// An object type whose values are plain [``Value::Object``]s. Field names are
/// snake case and exposed in lower camel case, like arguments.
#[derive(Debug, Clone)]
pub struct TypeDef {
    name: String,
    description: Option<String>,
    fields: Vec<(String, TypeRef)>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: vec![],
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.push((name.into(), ty));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self, name: &str) -> Option<&TypeRef> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }

    pub(crate) fn into_object(self) -> Object {
        let mut object = Object::new(self.name);
        if let Some(description) = self.description {
            object = object.description(description);
        }
        for (name, ty) in self.fields {
            object = object.field(value_field(field_name(&name), ty));
        }
        object
    }
}

/// A field that reads its value from the parent object
fn value_field(name: String, ty: TypeRef) -> Field {
    let key = name.clone();
    Field::new(name, ty, move |ctx| {
        let key = key.clone();
        FieldFuture::new(async move {
            let value = match ctx.parent_value.as_value() {
                Some(Value::Object(object)) => object.get(key.as_str()).cloned(),
                _ => None,
            };
            Ok(value
                .filter(|value| *value != Value::Null)
                .map(|value| FieldValue::value(value)))
        })
    })
}

/// Builds an object value, keys are converted like field names
pub fn object<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(name, value)| (Name::new(field_name(name)), value))
            .collect::<IndexMap<_, _>>(),
    )
}

pub fn authenticatable() -> TypeDef {
    TypeDef::new(AUTHENTICATABLE)
        .description("An account of a resource without a type of its own")
        .field("id", TypeRef::named_nn(TypeRef::ID))
        .field("email", TypeRef::named_nn(TypeRef::STRING))
        .field("confirmed", TypeRef::named_nn(TypeRef::BOOLEAN))
}

pub fn credentials() -> TypeDef {
    TypeDef::new(CREDENTIALS)
        .description(
            "Send ``accessToken``, ``client`` and ``uid`` as headers (``access-token``, \
             ``client``, ``uid``) to authenticate",
        )
        .field("access_token", TypeRef::named_nn(TypeRef::STRING))
        .field("client", TypeRef::named_nn(TypeRef::STRING))
        .field("uid", TypeRef::named_nn(TypeRef::STRING))
        .field("expiry", TypeRef::named_nn(TypeRef::INT))
        .field("token_type", TypeRef::named_nn(TypeRef::STRING))
}
