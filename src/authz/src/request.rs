//! Access request handling

use crate::error::{AuthzError, Result};
use crate::types::{Context, Resource, Subject};

/// A subject's intention to perform actions against a resource.
///
/// The request borrows its subject, resource and context, so deriving a
/// single-action request for parent-role traversal only copies the action.
#[derive(Debug, Clone)]
pub struct AccessRequest<'a> {
    /// Who is making the request
    pub subject: Option<&'a dyn Subject>,

    /// What resource is being accessed
    pub resource: Option<&'a dyn Resource>,

    /// Requested actions, evaluated in order
    pub actions: Vec<String>,

    /// Additional attributes available to conditions
    pub context: Option<&'a Context>,

    /// Grant any matching permission without checking its conditions
    pub skip_conditions: bool,

    /// Collect every failure instead of stopping at the first one
    pub complete_validation: bool,
}

impl<'a> AccessRequest<'a> {
    /// Create a request for the given actions
    pub fn new<I, S>(subject: &'a dyn Subject, resource: &'a dyn Resource, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: Some(subject),
            resource: Some(resource),
            actions: actions.into_iter().map(Into::into).collect(),
            context: None,
            skip_conditions: false,
            complete_validation: false,
        }
    }

    /// Attach a context
    pub fn with_context(mut self, context: &'a Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Skip condition checks
    pub fn skip_conditions(mut self, skip: bool) -> Self {
        self.skip_conditions = skip;
        self
    }

    /// Collect all failure reasons
    pub fn complete_validation(mut self, complete: bool) -> Self {
        self.complete_validation = complete;
        self
    }

    /// Same subject, resource, context and flags, restricted to one action.
    pub(crate) fn for_action(&self, action: &str) -> Self {
        Self {
            actions: vec![action.to_string()],
            ..self.clone()
        }
    }

    /// Check the request is complete enough to be evaluated.
    ///
    /// Returns the subject's roles and the resource name on success.
    pub(crate) fn validate(&self) -> Result<(Vec<String>, &'a str)> {
        let (Some(subject), Some(resource)) = (self.subject, self.resource) else {
            return Err(AuthzError::RequestMalformed(
                "Subject or Resource not defined".to_string(),
            ));
        };

        let roles = subject.roles();
        if roles.is_empty() {
            return Err(AuthzError::RequestMalformed(
                "Subject has no roles".to_string(),
            ));
        }

        let resource_name = resource.resource_name();
        if resource_name.is_empty() {
            return Err(AuthzError::RequestMalformed(
                "Missing resource name".to_string(),
            ));
        }

        if self.actions.is_empty() {
            return Err(AuthzError::RequestMalformed(
                "No actions requested".to_string(),
            ));
        }

        if self.actions.iter().any(String::is_empty) {
            return Err(AuthzError::RequestMalformed(
                "Action cannot be empty".to_string(),
            ));
        }

        Ok((roles, resource_name))
    }
}
