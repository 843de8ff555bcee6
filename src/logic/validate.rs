use crate::error::CoordError;
use crate::model::vocabulary::{oa, rdfs, xsd};
use crate::model::{EntityKind, NewEntity, Node, ReasonCode, UserContext, ValidationError};
use crate::store::traits::{IdentityService, SchemaService};
use log::debug;
use std::sync::Arc;

/// Collaborators every validator may consult
pub struct ValidationContext {
    pub kind: EntityKind,
    pub schema: Arc<dyn SchemaService>,
    pub identity: Arc<dyn IdentityService>,
}

/// One check over one candidate entity. Failures are pushed to `errors`;
/// `Err` is reserved for collaborators that could not answer.
#[async_trait::async_trait]
pub trait Validator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(
        &self,
        ctx: &ValidationContext,
        index: usize,
        entity: &NewEntity,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), CoordError>;
}

/// A supplied identifier marks the update path: it must already exist and
/// carry a type under the kind's root type
pub struct IdentityExists;

#[async_trait::async_trait]
impl Validator for IdentityExists {
    fn name(&self) -> &'static str {
        "identity"
    }

    async fn check(
        &self,
        ctx: &ValidationContext,
        index: usize,
        entity: &NewEntity,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), CoordError> {
        let Some(id) = &entity.id else {
            return Ok(());
        };
        if !ctx.identity.exists_uri(id).await? {
            errors.push(ValidationError::new(
                index,
                id.as_str(),
                ReasonCode::UnknownUri,
                format!("unknown identifier {}", id),
            ));
            return Ok(());
        }

        for rdf_type in ctx.identity.resource_types(id).await? {
            if ctx.schema.is_subtype_of(&rdf_type, &ctx.kind.root_type).await? {
                return Ok(());
            }
        }
        errors.push(ValidationError::new(
            index,
            id.as_str(),
            ReasonCode::WrongKind,
            format!("{} is not a {}", id, ctx.kind.name),
        ));
        Ok(())
    }
}

/// The type must be declared and lie under the kind's root type
pub struct TypeExists;

#[async_trait::async_trait]
impl Validator for TypeExists {
    fn name(&self) -> &'static str {
        "type"
    }

    async fn check(
        &self,
        ctx: &ValidationContext,
        index: usize,
        entity: &NewEntity,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), CoordError> {
        let rdf_type = entity.rdf_type.as_str();
        if !ctx.schema.type_exists(rdf_type).await? {
            errors.push(ValidationError::new(
                index,
                rdf_type,
                ReasonCode::UnknownType,
                format!("type {} is not declared", rdf_type),
            ));
        } else if !ctx
            .schema
            .is_subtype_of(rdf_type, &ctx.kind.root_type)
            .await?
        {
            errors.push(ValidationError::new(
                index,
                rdf_type,
                ReasonCode::TypeOutsideHierarchy,
                format!("{} is not a subtype of {}", rdf_type, ctx.kind.root_type),
            ));
        }
        Ok(())
    }
}

/// Scalar fields the kind cannot do without
pub struct RequiredFields;

#[async_trait::async_trait]
impl Validator for RequiredFields {
    fn name(&self) -> &'static str {
        "required"
    }

    async fn check(
        &self,
        ctx: &ValidationContext,
        index: usize,
        entity: &NewEntity,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), CoordError> {
        if ctx.kind.timestamped && entity.timestamp.is_none() {
            errors.push(ValidationError::new(
                index,
                "",
                ReasonCode::MissingTimestamp,
                format!("a {} needs a timestamp", ctx.kind.name),
            ));
        }
        if ctx.kind.labelled && entity.label.as_deref().map_or(true, |l| l.trim().is_empty()) {
            errors.push(ValidationError::new(
                index,
                "",
                ReasonCode::MissingLabel,
                format!("a {} needs a label", ctx.kind.name),
            ));
        }
        Ok(())
    }
}

/// Concerned items and annotations, each reporting its own reason
pub struct NestedCollections;

#[async_trait::async_trait]
impl Validator for NestedCollections {
    fn name(&self) -> &'static str {
        "nested"
    }

    async fn check(
        &self,
        ctx: &ValidationContext,
        index: usize,
        entity: &NewEntity,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), CoordError> {
        for item in &entity.concerned_items {
            if !ctx.identity.exists_uri(item).await? {
                errors.push(ValidationError::new(
                    index,
                    item.as_str(),
                    ReasonCode::UnknownConcernedItem,
                    format!("concerned item {} does not exist", item),
                ));
            }
        }

        for annotation in &entity.annotations {
            let motivation = annotation.motivation.as_str();
            let types = ctx.identity.resource_types(motivation).await?;
            if !types.iter().any(|t| t == oa::MOTIVATION) {
                errors.push(ValidationError::new(
                    index,
                    motivation,
                    ReasonCode::UnknownMotivation,
                    format!("{} is not a known motivation", motivation),
                ));
            }
            if annotation.body_values.iter().all(|b| b.trim().is_empty()) {
                errors.push(ValidationError::new(
                    index,
                    "",
                    ReasonCode::EmptyAnnotationBody,
                    "annotation has no body value",
                ));
            }
        }
        Ok(())
    }
}

/// Every attached property must accept the entity as domain and the value
/// as range
pub struct DomainRange;

impl DomainRange {
    fn literal_range(range: &str) -> bool {
        range == rdfs::LITERAL || range.starts_with(xsd::NAMESPACE)
    }
}

#[async_trait::async_trait]
impl Validator for DomainRange {
    fn name(&self) -> &'static str {
        "domain_range"
    }

    async fn check(
        &self,
        ctx: &ValidationContext,
        index: usize,
        entity: &NewEntity,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), CoordError> {
        for property in &entity.properties {
            let relation = property.relation.as_str();
            let Some((domain, range)) = ctx.schema.property_domain_range(relation).await? else {
                errors.push(ValidationError::new(
                    index,
                    relation,
                    ReasonCode::UnknownProperty,
                    format!("property {} is not declared", relation),
                ));
                continue;
            };

            if !ctx.schema.is_subtype_of(&entity.rdf_type, &domain).await? {
                errors.push(ValidationError::new(
                    index,
                    relation,
                    ReasonCode::DomainMismatch,
                    format!("{} does not apply to {}", relation, entity.rdf_type),
                ));
            }

            match &property.value {
                Node::Literal(value) => {
                    if !Self::literal_range(&range) {
                        errors.push(ValidationError::new(
                            index,
                            value.as_str(),
                            ReasonCode::RangeMismatch,
                            format!("{} expects a {} reference", relation, range),
                        ));
                    }
                }
                Node::Iri(value) => {
                    if Self::literal_range(&range) {
                        errors.push(ValidationError::new(
                            index,
                            value.as_str(),
                            ReasonCode::RangeMismatch,
                            format!("{} expects a literal", relation),
                        ));
                        continue;
                    }
                    let types = ctx.identity.resource_types(value).await?;
                    if types.is_empty() {
                        errors.push(ValidationError::new(
                            index,
                            value.as_str(),
                            ReasonCode::UnknownPropertyValue,
                            format!("{} does not exist", value),
                        ));
                        continue;
                    }
                    let mut in_range = false;
                    for value_type in &types {
                        if ctx.schema.is_subtype_of(value_type, &range).await? {
                            in_range = true;
                            break;
                        }
                    }
                    if !in_range {
                        errors.push(ValidationError::new(
                            index,
                            value.as_str(),
                            ReasonCode::RangeMismatch,
                            format!("{} is not a {}", value, range),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Ordered validators run over a whole batch. Every failure is collected;
/// only the permission precheck stops early.
pub struct ValidationPipeline {
    ctx: ValidationContext,
    validators: Vec<Box<dyn Validator>>,
    require_admin: bool,
}

impl ValidationPipeline {
    pub fn new(ctx: ValidationContext, require_admin: bool) -> Self {
        Self {
            ctx,
            validators: vec![
                Box::new(IdentityExists),
                Box::new(TypeExists),
                Box::new(RequiredFields),
                Box::new(NestedCollections),
                Box::new(DomainRange),
            ],
            require_admin,
        }
    }

    pub fn with_validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn kind(&self) -> &EntityKind {
        &self.ctx.kind
    }

    pub fn authorize(&self, user: &UserContext) -> Result<(), CoordError> {
        if self.require_admin && !user.is_admin() {
            return Err(CoordError::authorization(format!(
                "user {} may not write {} entities",
                user.user_id, self.ctx.kind.name
            )));
        }
        Ok(())
    }

    /// Empty result means the batch is valid
    pub async fn validate(
        &self,
        user: &UserContext,
        entities: &[NewEntity],
    ) -> Result<Vec<ValidationError>, CoordError> {
        self.authorize(user)?;

        let mut errors = Vec::new();
        for (index, entity) in entities.iter().enumerate() {
            for validator in &self.validators {
                let before = errors.len();
                validator.check(&self.ctx, index, entity, &mut errors).await?;
                if errors.len() > before {
                    debug!(
                        "Validator {} rejected entity #{}: {} error(s)",
                        validator.name(),
                        index,
                        errors.len() - before
                    );
                }
            }
        }
        Ok(errors)
    }
}
