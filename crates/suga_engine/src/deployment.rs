//! State and phases of a single resolution pass.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use suga_plugins::{PluginManifest, RuntimeModule};
use suga_spec::{
    AccessMap, ApplicationSpec, BucketIntent, DatabaseIntent, EntrypointIntent, PlatformSpec,
    ResourceBlueprint, ResourceIntent, ResourceType, ServiceIntent,
};

use crate::access::{access_descriptor, expand_actions};
use crate::blueprint::{BlueprintResolver, DEFAULT_SUBTYPE};
use crate::codegen::CodeGenerator;
use crate::deps::dependency_edges;
use crate::env::EnvAccumulator;
use crate::error::{EngineError, EngineResult};
use crate::identity::{check_required_identities, identity_module_name, IdentityOutputs};
use crate::infra::{declared, InfraTable};
use crate::module::{instance_variable_name, ModuleKind, ResolvedModule, ResolvedStack};
use crate::runtime::PluginDefinition;
use crate::token::{SpecReference, TokenSource};

/// Capability a service plugin must declare to run scheduled triggers.
pub const SCHEDULES_CAPABILITY: &str = "schedules";

/// A created module whose properties and edges are still to be resolved.
#[derive(Clone)]
struct Pending<'a> {
    module: String,
    kind: ModuleKind,
    blueprint: &'a ResourceBlueprint,
}

/// One pass over an application. Consumed by [`Deployment::run`].
pub(crate) struct Deployment<'a> {
    app: &'a ApplicationSpec,
    platform: &'a PlatformSpec,
    resolver: BlueprintResolver<'a>,
    generator: &'a dyn CodeGenerator,
    input_variable: &'a str,
    stack: ResolvedStack,
    infra: InfraTable,
    pending: Vec<Pending<'a>>,
    scopes: HashMap<String, HashSet<String>>,
    services: IndexMap<String, (&'a ResourceBlueprint, PluginManifest)>,
    identities: IndexMap<String, IdentityOutputs>,
    env: EnvAccumulator,
    storage_runtimes: Option<Vec<(String, RuntimeModule)>>,
}

impl<'a> Deployment<'a> {
    pub(crate) fn new(
        app: &'a ApplicationSpec,
        resolver: BlueprintResolver<'a>,
        generator: &'a dyn CodeGenerator,
        stack_name: &str,
        input_variable: &'a str,
    ) -> Self {
        Self {
            app,
            platform: resolver.platform(),
            resolver,
            generator,
            input_variable,
            stack: ResolvedStack::new(stack_name),
            infra: InfraTable::new(),
            pending: Vec::new(),
            scopes: HashMap::new(),
            services: IndexMap::new(),
            identities: IndexMap::new(),
            env: EnvAccumulator::new(),
            storage_runtimes: None,
        }
    }

    /// Run every resolution phase and return the finished stack.
    pub(crate) fn run(mut self) -> EngineResult<ResolvedStack> {
        let app = self.app;
        info!("Resolving stack {}", self.stack.name);

        self.declare_variables();
        info!("Declared {} platform variables", self.stack.variables.len());

        for (name, intent) in &app.services {
            self.resolve_identities(name, intent)
                .map_err(|e| e.in_resource(name))?;
        }
        info!("Resolved {} service identities", self.stack.identities.len());

        for (name, intent) in &app.buckets {
            self.resolve_bucket(name, intent)
                .map_err(|e| e.in_resource(name))?;
        }
        for (name, intent) in &app.databases {
            self.resolve_database(name, intent)
                .map_err(|e| e.in_resource(name))?;
        }
        info!(
            "Resolved {} buckets and {} databases",
            app.buckets.len(),
            app.databases.len()
        );

        for (name, intent) in &app.services {
            self.resolve_service(name, intent)
                .map_err(|e| e.in_resource(name))?;
        }
        info!("Resolved {} services", app.services.len());

        for (name, intent) in &app.entrypoints {
            self.resolve_entrypoint(name, intent)
                .map_err(|e| e.in_resource(name))?;
        }
        info!("Resolved {} entrypoints", app.entrypoints.len());

        self.resolve_properties()?;
        info!(
            "Resolved module properties, {} infra modules",
            self.infra.len()
        );

        self.resolve_dependencies()?;

        let mut stack = self.stack;
        stack.infra = self.infra.into_modules();
        info!(
            "Stack {} resolved: {} modules, {} dependency edges",
            stack.name,
            stack.all_modules().count(),
            stack.edge_count()
        );
        Ok(stack)
    }

    fn declare_variables(&mut self) {
        for (name, variable) in &self.platform.variables {
            debug!("Declaring platform variable {}", name);
            self.stack.variables.insert(name.clone(), variable.clone());
        }
    }

    fn resolve_identities(&mut self, service: &str, intent: &ServiceIntent) -> EngineResult<()> {
        let blueprint = self
            .resolver
            .resolve_blueprint(ResourceType::Service, &intent.subtype)?;
        let plugin = self.resolver.resolve_plugin(blueprint)?;

        let mut outputs = IdentityOutputs::new();
        for identity in &blueprint.identities {
            let manifest = self.resolver.resolve_identity_plugin(identity)?;
            let reference = self.resolver.qualify(&identity.plugin)?;
            let name = identity_module_name(service, &manifest.name);

            let mut module = ResolvedModule::new(
                &name,
                ModuleKind::Identity,
                reference.to_string(),
                manifest.deployment.terraform.clone(),
            );
            module.set(
                self.input_variable,
                json!({
                    "name": service,
                    "stack_id": self.generator.stack_id(),
                }),
            );

            if let Some(identity_type) = manifest.identity_type() {
                outputs.insert(
                    identity_type.to_string(),
                    self.generator.output(&name, self.input_variable),
                );
            }

            debug!("Created identity module {} for {}", name, service);
            self.add_module(module, identity)?;
        }

        check_required_identities(service, &plugin, &outputs)?;

        self.identities.insert(service.to_string(), outputs);
        self.services
            .insert(service.to_string(), (blueprint, plugin));
        Ok(())
    }

    fn resolve_bucket(&mut self, name: &str, intent: &BucketIntent) -> EngineResult<()> {
        let services = self.grant_access(name, ResourceType::Bucket, &intent.access)?;
        let input = json!({
            "name": name,
            "stack_id": self.generator.stack_id(),
            "content_path": intent.content_path.clone().unwrap_or_default(),
            "services": services,
        });
        self.resolve_resource(name, ResourceIntent::Bucket(intent), input)?;
        self.collect_exports(name, &intent.access);
        Ok(())
    }

    fn resolve_database(&mut self, name: &str, intent: &DatabaseIntent) -> EngineResult<()> {
        let services = self.grant_access(name, ResourceType::Database, &intent.access)?;
        let input = json!({
            "name": name,
            "stack_id": self.generator.stack_id(),
            "services": services,
            "env_var_key": intent.env_var_key,
        });
        self.resolve_resource(name, ResourceIntent::Database(intent), input)?;
        self.collect_exports(name, &intent.access);
        Ok(())
    }

    fn resolve_service(&mut self, name: &str, intent: &ServiceIntent) -> EngineResult<()> {
        let (blueprint, plugin) = self
            .services
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::Generation(format!("service {} was not resolved", name)))?;

        let mut schedules = Map::new();
        for (trigger, spec) in intent.schedules() {
            if let Some(schedule) = &spec.schedule {
                schedules.insert(
                    trigger.clone(),
                    json!({
                        "cron_expression": schedule.cron_expression,
                        "path": spec.path,
                    }),
                );
            }
        }
        if !schedules.is_empty() && !plugin.supports(SCHEDULES_CAPABILITY) {
            return Err(EngineError::UnsupportedCapability {
                service: name.to_string(),
                plugin: plugin.name.clone(),
                capability: SCHEDULES_CAPABILITY.to_string(),
            });
        }

        let mut definition = PluginDefinition::for_service(name, &plugin)?;
        for (storage, runtime) in self.storage_runtimes()? {
            definition = definition.with_storage(&storage, &runtime);
        }

        let identities = self.identities.get(name).cloned().unwrap_or_default();
        let input = json!({
            "name": name,
            "stack_id": self.generator.stack_id(),
            "env": self.env.merged(name, &intent.env, self.generator),
            "schedules": schedules,
            "identities": identities,
            "container": serde_json::to_value(&intent.container)?,
            "runtime": plugin.runtime.as_ref().map(|r| r.go_module.clone()),
            "plugins": serde_json::to_value(&definition)?,
        });

        self.create_module(name, ModuleKind::Service, blueprint, &plugin, input)
    }

    fn resolve_entrypoint(&mut self, name: &str, intent: &EntrypointIntent) -> EngineResult<()> {
        let mut origins = Map::new();
        for (path, route) in &intent.routes {
            let target = self.app.resource_intent(&route.name).ok_or_else(|| {
                EngineError::RouteTargetNotFound {
                    entrypoint: name.to_string(),
                    route: path.clone(),
                    target: route.name.clone(),
                }
            })?;

            let target_type = target.resource_type();
            if !matches!(target_type, ResourceType::Service | ResourceType::Bucket) {
                return Err(EngineError::InvalidRouteTarget {
                    entrypoint: name.to_string(),
                    route: path.clone(),
                    target_type: target_type.to_string(),
                });
            }

            let output = |property: &str| {
                self.generator
                    .output(&route.name, &format!("{}.{}", self.input_variable, property))
            };
            origins.insert(
                route.name.clone(),
                json!({
                    "path": path,
                    "base_path": route.base_path,
                    "type": target_type.as_str(),
                    "id": output("id"),
                    "domain_name": output("domain_name"),
                    "resources": output("exports.resources"),
                }),
            );
        }

        let input = json!({
            "name": name,
            "stack_id": self.generator.stack_id(),
            "origins": origins,
        });
        self.resolve_resource(name, ResourceIntent::Entrypoint(intent), input)
    }

    /// Build the `services` descriptor map for a bucket or database.
    fn grant_access(
        &self,
        resource: &str,
        category: ResourceType,
        access: &AccessMap,
    ) -> EngineResult<Map<String, Value>> {
        let mut services = Map::new();
        for (service, actions) in access {
            let identities = self.identities.get(service).ok_or_else(|| {
                EngineError::AccessGrantToUnknownService {
                    resource: resource.to_string(),
                    service: service.clone(),
                }
            })?;
            let actions = expand_actions(resource, actions, category)?;
            services.insert(service.clone(), access_descriptor(actions, identities));
        }
        Ok(services)
    }

    /// Route the env a resource exports to each service it grants access to.
    fn collect_exports(&mut self, resource: &str, access: &AccessMap) {
        for service in access.keys() {
            let path = format!("{}.exports.services.{}.env", self.input_variable, service);
            self.env
                .push(service.clone(), self.generator.optional_output(resource, &path));
        }
    }

    fn resolve_resource(
        &mut self,
        name: &str,
        intent: ResourceIntent<'_>,
        input: Value,
    ) -> EngineResult<()> {
        let resource_type = intent.resource_type();
        let blueprint = self
            .resolver
            .resolve_blueprint(resource_type, intent.subtype())?;
        let plugin = self.resolver.resolve_plugin(blueprint)?;
        self.create_module(name, resource_type.into(), blueprint, &plugin, input)
    }

    fn create_module(
        &mut self,
        name: &str,
        kind: ModuleKind,
        blueprint: &'a ResourceBlueprint,
        plugin: &PluginManifest,
        input: Value,
    ) -> EngineResult<()> {
        let reference = self.resolver.qualify(&blueprint.plugin)?;
        let mut module = ResolvedModule::new(
            name,
            kind,
            reference.to_string(),
            plugin.deployment.terraform.clone(),
        );
        module.set(self.input_variable, input);

        debug!("Created {} module {} from {}", kind, name, reference);
        self.add_module(module, blueprint)
    }

    /// Runtimes of every bucket plugin the platform offers, looked up once.
    fn storage_runtimes(&mut self) -> EngineResult<Vec<(String, RuntimeModule)>> {
        if let Some(runtimes) = &self.storage_runtimes {
            return Ok(runtimes.clone());
        }

        let mut runtimes = Vec::new();
        if let Some(category) = self.platform.category(ResourceType::Bucket) {
            let blueprints = std::iter::once((DEFAULT_SUBTYPE, &category.base)).chain(
                category
                    .subtypes
                    .iter()
                    .map(|(name, blueprint)| (name.as_str(), blueprint)),
            );
            for (name, blueprint) in blueprints {
                match self.resolver.resolve_plugin(blueprint)?.runtime {
                    Some(runtime) => runtimes.push((name.to_string(), runtime)),
                    None => debug!("Bucket plugin for subtype {} has no runtime", name),
                }
            }
        }

        self.storage_runtimes = Some(runtimes.clone());
        Ok(runtimes)
    }

    fn add_module(
        &mut self,
        module: ResolvedModule,
        blueprint: &'a ResourceBlueprint,
    ) -> EngineResult<()> {
        let name = module.name.as_str();
        if self.stack.modules.contains_key(name)
            || self.stack.identities.contains_key(name)
            || self.infra.contains(name)
        {
            return Err(EngineError::DuplicateModule {
                name: name.to_string(),
            });
        }

        self.register_variables(&module.name, blueprint)?;
        self.pending.push(Pending {
            module: module.name.clone(),
            kind: module.kind,
            blueprint,
        });

        let modules = match module.kind {
            ModuleKind::Identity => &mut self.stack.identities,
            _ => &mut self.stack.modules,
        };
        modules.insert(module.name.clone(), module);
        Ok(())
    }

    /// Declare a blueprint's variables in the module's scope.
    ///
    /// Instance variables share one namespace with platform variables.
    fn register_variables(
        &mut self,
        module: &str,
        blueprint: &ResourceBlueprint,
    ) -> EngineResult<()> {
        let scope = self.scopes.entry(module.to_string()).or_default();
        for (name, variable) in &blueprint.variables {
            let instance = instance_variable_name(module, name);
            if self.stack.variables.contains_key(&instance)
                || self.stack.instance_variables.contains_key(&instance)
            {
                return Err(EngineError::DuplicateVariable {
                    variable: instance,
                    module: module.to_string(),
                });
            }
            scope.insert(name.clone());
            self.stack.instance_variables.insert(instance, variable.clone());
        }
        Ok(())
    }

    /// Resolve properties of application and identity modules, then of every
    /// infra module until none is left unresolved.
    fn resolve_properties(&mut self) -> EngineResult<()> {
        for pending in self.pending.clone() {
            let mut resolved = IndexMap::new();
            for (property, value) in &pending.blueprint.properties {
                let value = self
                    .resolve_value(&pending.module, value)
                    .map_err(|e| e.in_resource(&pending.module))?;
                resolved.insert(property.clone(), value);
            }

            let modules = match pending.kind {
                ModuleKind::Identity => &mut self.stack.identities,
                _ => &mut self.stack.modules,
            };
            if let Some(module) = modules.get_mut(&pending.module) {
                module.variables.extend(resolved);
            }
        }

        let platform = self.platform;
        for name in platform.infra.keys() {
            self.infra.resolve_or_get(name, &self.resolver)?;
        }

        while let Some(name) = self.infra.next_pending() {
            if self.stack.modules.contains_key(&name) || self.stack.identities.contains_key(&name) {
                return Err(EngineError::DuplicateModule { name });
            }
            let blueprint = declared(&self.resolver, &name, None)?;
            self.register_variables(&name, blueprint)
                .map_err(|e| e.in_resource(&name))?;

            let mut resolved = IndexMap::new();
            for (property, value) in &blueprint.properties {
                let value = self
                    .resolve_value(&name, value)
                    .map_err(|e| e.in_resource(&name))?;
                resolved.insert(property.clone(), value);
            }

            if let Some(module) = self.infra.module_mut(&name) {
                module.variables.extend(resolved);
            }
            self.infra.mark_resolved(&name);
        }

        Ok(())
    }

    fn resolve_dependencies(&mut self) -> EngineResult<()> {
        let mut edges = 0;

        for pending in &self.pending {
            let targets = dependency_edges(&pending.module, &pending.blueprint.depends_on, self.platform)
                .map_err(|e| e.in_resource(&pending.module))?;
            let modules = match pending.kind {
                ModuleKind::Identity => &mut self.stack.identities,
                _ => &mut self.stack.modules,
            };
            if let Some(module) = modules.get_mut(&pending.module) {
                for target in targets {
                    module.add_dependency(target);
                }
                edges += module.depends_on.len();
            }
        }

        for (name, blueprint) in &self.platform.infra {
            let targets = dependency_edges(name, &blueprint.depends_on, self.platform)
                .map_err(|e| e.in_resource(name))?;
            if let Some(module) = self.infra.module_mut(name) {
                for target in targets {
                    module.add_dependency(target);
                }
                edges += module.depends_on.len();
            }
        }

        info!("Computed {} dependency edges", edges);
        Ok(())
    }

    /// Resolve tokens in a property value, recursing through maps and lists.
    fn resolve_value(&mut self, instance: &str, value: &Value) -> EngineResult<Value> {
        match value {
            Value::Object(map) => {
                let mut resolved = Map::new();
                for (key, value) in map {
                    resolved.insert(key.clone(), self.resolve_value(instance, value)?);
                }
                Ok(Value::Object(resolved))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(instance, item))
                .collect::<EngineResult<Vec<_>>>()
                .map(Value::Array),
            Value::String(token) => self.resolve_token(instance, token),
            other => Ok(other.clone()),
        }
    }

    fn resolve_token(&mut self, instance: &str, token: &str) -> EngineResult<Value> {
        let Some(reference) = SpecReference::parse(token) else {
            return Ok(Value::String(token.to_string()));
        };
        let name = reference.name();

        match &reference.source {
            TokenSource::Infra => {
                let property = reference.property();
                declared(&self.resolver, name, property.as_deref())?;

                let unresolved = || EngineError::UnresolvedReference {
                    origin: TokenSource::Infra.to_string(),
                    name: name.to_string(),
                    property: reference.property(),
                };
                let Some(property) = property else {
                    return Err(unresolved());
                };

                let manifest = self.infra.resolve_or_get(name, &self.resolver)?;
                if !manifest.exposes(&reference.path[1]) {
                    return Err(unresolved());
                }
                Ok(self.generator.output(name, &property))
            }
            TokenSource::SelfRef => {
                let in_scope = self
                    .scopes
                    .get(instance)
                    .map_or(false, |scope| scope.contains(name));
                if !in_scope {
                    return Err(EngineError::UnresolvedReference {
                        origin: TokenSource::SelfRef.to_string(),
                        name: name.to_string(),
                        property: None,
                    });
                }
                Ok(self
                    .generator
                    .variable(&instance_variable_name(instance, name)))
            }
            TokenSource::Var => {
                if !self.platform.variables.contains_key(name) {
                    return Err(EngineError::UnresolvedReference {
                        origin: TokenSource::Var.to_string(),
                        name: name.to_string(),
                        property: None,
                    });
                }
                Ok(self.generator.variable(name))
            }
            TokenSource::Other(_) => Ok(Value::String(token.to_string())),
        }
    }
}
