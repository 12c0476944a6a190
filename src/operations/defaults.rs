use std::sync::Arc;

use async_graphql::{dynamic::TypeRef, to_value, Context, Error, ErrorExtensions, Result, Value};
use async_trait::async_trait;
use log::debug;

use super::{Argument, Arguments, Operation, OperationKind};
use crate::{
    identity::{
        Authenticatable, Credentials, IdentityError, IdentityProvider, SignUpInput,
        UpdatePasswordInput,
    },
    resource::Resource,
    schema::{types, TypeDef},
};

const RESET_PASSWORD_SENT: &str =
    "You will receive an email with instructions on how to reset your password in a few minutes.";
const CONFIRMATION_SENT: &str =
    "You will receive an email with instructions for how to confirm your email address in a few minutes.";

/// DefaultOperation
///
/// The operations every resource gets unless the mount says otherwise. They
/// delegate the actual work to the [``IdentityProvider``] in the schema data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultOperation {
    Login,
    Logout,
    SignUp,
    UpdatePassword,
    SendPasswordReset,
    ResendConfirmation,
    ConfirmAccount,
    CheckPasswordToken,
}

impl DefaultOperation {
    pub const MUTATIONS: [DefaultOperation; 6] = [
        DefaultOperation::Login,
        DefaultOperation::Logout,
        DefaultOperation::SignUp,
        DefaultOperation::UpdatePassword,
        DefaultOperation::SendPasswordReset,
        DefaultOperation::ResendConfirmation,
    ];

    pub const QUERIES: [DefaultOperation; 2] = [
        DefaultOperation::ConfirmAccount,
        DefaultOperation::CheckPasswordToken,
    ];

    /// The bare name as used in ``only``, ``skip`` and overrides
    pub fn name(self) -> &'static str {
        match self {
            DefaultOperation::Login => "login",
            DefaultOperation::Logout => "logout",
            DefaultOperation::SignUp => "sign_up",
            DefaultOperation::UpdatePassword => "update_password",
            DefaultOperation::SendPasswordReset => "send_password_reset",
            DefaultOperation::ResendConfirmation => "resend_confirmation",
            DefaultOperation::ConfirmAccount => "confirm_account",
            DefaultOperation::CheckPasswordToken => "check_password_token",
        }
    }

    pub fn kind(self) -> OperationKind {
        match self {
            DefaultOperation::ConfirmAccount | DefaultOperation::CheckPasswordToken => {
                OperationKind::Query
            }
            _ => OperationKind::Mutation,
        }
    }

    pub fn arguments(self) -> Vec<Argument> {
        match self {
            DefaultOperation::Login => vec![
                Argument::required_string("email"),
                Argument::required_string("password"),
            ],
            DefaultOperation::Logout => vec![],
            DefaultOperation::SignUp => vec![
                Argument::required_string("email"),
                Argument::required_string("password"),
                Argument::required_string("password_confirmation"),
                Argument::string("confirm_success_url"),
            ],
            DefaultOperation::UpdatePassword => vec![
                Argument::required_string("password"),
                Argument::required_string("password_confirmation"),
                Argument::string("current_password"),
            ],
            DefaultOperation::SendPasswordReset | DefaultOperation::ResendConfirmation => vec![
                Argument::required_string("email"),
                Argument::required_string("redirect_url"),
            ],
            DefaultOperation::ConfirmAccount => vec![
                Argument::required_string("confirmation_token"),
                Argument::string("redirect_url"),
            ],
            DefaultOperation::CheckPasswordToken => vec![
                Argument::required_string("reset_password_token"),
                Argument::string("redirect_url"),
            ],
        }
    }

    /// Binds the operation to ``resource``. The result is a new value, the
    /// catalog entry stays untouched and can be bound to other resources.
    pub fn bind(self, resource: &Resource, authenticatable_type: &str) -> ResourceOperation {
        ResourceOperation {
            operation: self,
            graphql_name: resource.graphql_name(self.name()),
            resource: resource.clone(),
            authenticatable_type: authenticatable_type.to_string(),
        }
    }
}

/// ResourceOperation
///
/// A [``DefaultOperation``] bound to a resource. It carries the public name
/// (``UserSignUp``), the type accounts are returned as and the resource the
/// [``IdentityProvider``] has to look accounts up for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOperation {
    operation: DefaultOperation,
    resource: Resource,
    graphql_name: String,
    authenticatable_type: String,
}

impl ResourceOperation {
    pub fn operation(&self) -> DefaultOperation {
        self.operation
    }

    pub fn authenticatable_type(&self) -> &str {
        &self.authenticatable_type
    }

    fn payload_name(&self) -> String {
        format!("{}Payload", self.graphql_name)
    }

    /// The payload object, ``None`` if the operation returns the account itself
    fn payload(&self) -> Option<TypeDef> {
        let authenticatable = TypeRef::named_nn(self.authenticatable_type.as_str());
        let payload = TypeDef::new(self.payload_name());
        let payload = match self.operation {
            DefaultOperation::ConfirmAccount => return None,
            DefaultOperation::Login | DefaultOperation::CheckPasswordToken => payload
                .field("authenticatable", authenticatable)
                .field("credentials", TypeRef::named_nn(types::CREDENTIALS)),
            // no credentials if the account has to be confirmed first
            DefaultOperation::SignUp => payload
                .field("authenticatable", authenticatable)
                .field("credentials", TypeRef::named(types::CREDENTIALS)),
            DefaultOperation::Logout | DefaultOperation::UpdatePassword => {
                payload.field("authenticatable", authenticatable)
            }
            DefaultOperation::SendPasswordReset | DefaultOperation::ResendConfirmation => {
                payload.field("message", TypeRef::named_nn(TypeRef::STRING))
            }
        };
        Some(payload)
    }
}

#[async_trait]
impl Operation for ResourceOperation {
    fn graphql_name(&self) -> &str {
        &self.graphql_name
    }

    fn return_type(&self) -> TypeRef {
        match self.operation {
            DefaultOperation::ConfirmAccount => {
                TypeRef::named_nn(self.authenticatable_type.as_str())
            }
            _ => TypeRef::named_nn(self.payload_name()),
        }
    }

    fn arguments(&self) -> Vec<Argument> {
        self.operation.arguments()
    }

    fn types(&self) -> Vec<TypeDef> {
        let mut defs = vec![types::credentials()];
        if self.authenticatable_type == types::AUTHENTICATABLE {
            defs.push(types::authenticatable());
        }
        defs.extend(self.payload());
        defs
    }

    fn resource(&self) -> Option<&Resource> {
        Some(&self.resource)
    }

    async fn resolve(&self, ctx: &Context<'_>, args: Arguments) -> Result<Value> {
        let identity = ctx.data::<Arc<dyn IdentityProvider>>()?;
        let resource = &self.resource;
        debug!("resolving {} for {}", self.graphql_name, resource);

        match self.operation {
            DefaultOperation::Login => {
                let session = identity
                    .login(resource, &args.string("email")?, &args.string("password")?)
                    .await
                    .map_err(|e| e.extend())?;
                value(&session)
            }
            DefaultOperation::Logout => {
                let authenticatable = identity
                    .logout(resource, current(ctx)?)
                    .await
                    .map_err(|e| e.extend())?;
                payload(&authenticatable)
            }
            DefaultOperation::SignUp => {
                let input = SignUpInput {
                    email: args.string("email")?,
                    password: args.string("password")?,
                    password_confirmation: args.string("password_confirmation")?,
                    confirm_success_url: args.opt_string("confirm_success_url"),
                };
                let session = identity
                    .sign_up(resource, input)
                    .await
                    .map_err(|e| e.extend())?;
                value(&session)
            }
            DefaultOperation::UpdatePassword => {
                let input = UpdatePasswordInput {
                    password: args.string("password")?,
                    password_confirmation: args.string("password_confirmation")?,
                    current_password: args.opt_string("current_password"),
                };
                let authenticatable = identity
                    .update_password(resource, current(ctx)?, input)
                    .await
                    .map_err(|e| e.extend())?;
                payload(&authenticatable)
            }
            DefaultOperation::SendPasswordReset => {
                identity
                    .send_password_reset(
                        resource,
                        &args.string("email")?,
                        &args.string("redirect_url")?,
                    )
                    .await
                    .map_err(|e| e.extend())?;
                Ok(types::object([("message", Value::from(RESET_PASSWORD_SENT))]))
            }
            DefaultOperation::ResendConfirmation => {
                identity
                    .resend_confirmation(
                        resource,
                        &args.string("email")?,
                        &args.string("redirect_url")?,
                    )
                    .await
                    .map_err(|e| e.extend())?;
                Ok(types::object([("message", Value::from(CONFIRMATION_SENT))]))
            }
            DefaultOperation::ConfirmAccount => {
                let authenticatable = identity
                    .confirm_account(resource, &args.string("confirmation_token")?)
                    .await
                    .map_err(|e| e.extend())?;
                value(&authenticatable)
            }
            DefaultOperation::CheckPasswordToken => {
                let session = identity
                    .check_password_token(resource, &args.string("reset_password_token")?)
                    .await
                    .map_err(|e| e.extend())?;
                value(&session)
            }
        }
    }
}

/// The credentials the request was sent with
fn current<'a>(ctx: &'a Context<'_>) -> Result<&'a Credentials> {
    ctx.data_opt::<Credentials>()
        .ok_or_else(|| IdentityError::NotAuthenticated.extend())
}

fn value<T: serde::Serialize>(value: &T) -> Result<Value> {
    to_value(value).map_err(|e| Error::new(e.to_string()))
}

fn payload(authenticatable: &Authenticatable) -> Result<Value> {
    Ok(types::object([("authenticatable", value(authenticatable)?)]))
}
