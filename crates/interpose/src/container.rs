//! A lifecycle-aware bean container.
//!
//! Beans are described once with a [`BeanDescriptor`]: how to construct
//! them, which interceptors wrap construction and lifecycle events, and which
//! business methods are intercepted. The descriptor resolves every chain up
//! front, so creating instances and invoking methods never looks anything up
//! beyond the method name.
//!
//! # Example
//!
//! ```
//! use interpose::container::{BeanDescriptor, Container};
//! use interpose::interceptors::LoggingInterceptor;
//! use interpose::{argument, ConstructorHandle, MethodHandle, Value};
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let descriptor = BeanDescriptor::builder(
//!     "greeter",
//!     ConstructorHandle::of::<Greeter, _>(1, |params| {
//!         Ok(Greeter { greeting: argument::<String>(params, 0)?.clone() })
//!     }),
//! )
//! .interceptor(LoggingInterceptor::new())
//! .method(MethodHandle::typed::<Greeter, _>("greet", 1, |greeter, args| {
//!     Ok(Value::new(format!("{}, {}", greeter.greeting, argument::<String>(args, 0)?)))
//! }))
//! .build()
//! .unwrap();
//!
//! let mut container = Container::new();
//! container.register(descriptor).unwrap();
//!
//! let greeter = container
//!     .create("greeter", vec![Value::new("Hello".to_string())])
//!     .unwrap();
//! let reply = greeter.invoke("greet", vec![Value::new("Ada".to_string())]).unwrap();
//! assert_eq!(reply.downcast_ref::<String>().unwrap(), "Hello, Ada");
//!
//! greeter.destroy().unwrap();
//! ```

use crate::error::ContainerError;
use indexmap::IndexMap;
use interpose_config::ContainerConfig;
use interpose_core::{
    ConstructorHandle, InterceptedMethodMetadata, InterceptionType, Interceptor,
    InterceptorBinding, InterceptorBindings, InterceptorInvocation, InvocationContexts,
    InvocationResult, MethodHandle, Value,
};
use interpose_telemetry::metrics::record_lifecycle;
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// The resolved interception plan for one bean.
pub struct BeanDescriptor {
    name: String,
    constructor: ConstructorHandle,
    bindings: InterceptorBindings,
    around_construct: Vec<InterceptorInvocation>,
    post_construct: Vec<InterceptorInvocation>,
    pre_destroy: Vec<InterceptorInvocation>,
    methods: IndexMap<String, Arc<InterceptedMethodMetadata>>,
}

impl BeanDescriptor {
    /// Starts describing a bean built by `constructor`.
    pub fn builder(name: impl Into<String>, constructor: ConstructorHandle) -> BeanDescriptorBuilder {
        BeanDescriptorBuilder::new(name.into(), constructor)
    }

    /// Returns the bean name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the constructor handle.
    pub fn constructor(&self) -> &ConstructorHandle {
        &self.constructor
    }

    /// Returns the class-level interceptor bindings.
    pub fn bindings(&self) -> &InterceptorBindings {
        &self.bindings
    }

    /// Returns the ordered chain for `kind`, or `None` for around-invoke,
    /// whose chains are per method.
    pub fn lifecycle_chain(&self, kind: InterceptionType) -> Option<&[InterceptorInvocation]> {
        match kind {
            InterceptionType::AroundConstruct => Some(&self.around_construct),
            InterceptionType::PostConstruct => Some(&self.post_construct),
            InterceptionType::PreDestroy => Some(&self.pre_destroy),
            InterceptionType::AroundInvoke => None,
        }
    }

    /// Returns the interception metadata of a business method.
    pub fn method(&self, name: &str) -> Option<&Arc<InterceptedMethodMetadata>> {
        self.methods.get(name)
    }

    /// Returns the intercepted method names in registration order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Every chain with its label, for limit checks and diagnostics.
    fn chains(&self) -> impl Iterator<Item = (&str, usize)> {
        [
            InterceptionType::AroundConstruct,
            InterceptionType::PostConstruct,
            InterceptionType::PreDestroy,
        ]
        .into_iter()
        .filter_map(move |kind| self.lifecycle_chain(kind).map(|chain| (kind.name(), chain.len())))
        .chain(
            self.methods
                .iter()
                .map(|(name, metadata)| (name.as_str(), metadata.len())),
        )
    }

    fn describe(&self) -> serde_json::Value {
        let names = |chain: &[InterceptorInvocation]| -> Vec<&'static str> {
            chain.iter().map(InterceptorInvocation::name).collect()
        };
        let methods: serde_json::Map<String, serde_json::Value> = self
            .methods
            .iter()
            .map(|(name, metadata)| {
                (
                    name.clone(),
                    json!({
                        "parameters": metadata.method().parameter_count(),
                        "interceptors": metadata.interceptor_names(),
                        "bindings": metadata.bindings(),
                    }),
                )
            })
            .collect();

        json!({
            "name": self.name,
            "type": self.constructor.declaring_type(),
            "bindings": self.bindings,
            "around_construct": names(&self.around_construct),
            "post_construct": names(&self.post_construct),
            "pre_destroy": names(&self.pre_destroy),
            "methods": methods,
        })
    }
}

impl fmt::Debug for BeanDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDescriptor")
            .field("name", &self.name)
            .field("constructor", &self.constructor)
            .field("around_construct", &self.around_construct.len())
            .field("post_construct", &self.post_construct.len())
            .field("pre_destroy", &self.pre_destroy.len())
            .field("methods", &self.methods.len())
            .finish_non_exhaustive()
    }
}

struct MethodEntry {
    handle: MethodHandle,
    interceptors: Vec<Arc<dyn Interceptor>>,
    bindings: Vec<InterceptorBinding>,
}

/// Builder for [`BeanDescriptor`].
///
/// Interceptors are ordered by [`Interceptor::priority`] (lower first) when
/// the descriptor is built; equal priorities keep registration order. For
/// business methods, class-level interceptors are registered before
/// method-level ones.
#[must_use]
pub struct BeanDescriptorBuilder {
    name: String,
    constructor: ConstructorHandle,
    bindings: Vec<InterceptorBinding>,
    class_interceptors: Vec<Arc<dyn Interceptor>>,
    around_construct: Vec<Arc<dyn Interceptor>>,
    post_construct: Vec<Arc<dyn Interceptor>>,
    pre_destroy: Vec<Arc<dyn Interceptor>>,
    methods: IndexMap<String, MethodEntry>,
    method_interceptors: Vec<(String, Arc<dyn Interceptor>)>,
    method_bindings: Vec<(String, InterceptorBinding)>,
}

impl BeanDescriptorBuilder {
    fn new(name: String, constructor: ConstructorHandle) -> Self {
        Self {
            name,
            constructor,
            bindings: Vec::new(),
            class_interceptors: Vec::new(),
            around_construct: Vec::new(),
            post_construct: Vec::new(),
            pre_destroy: Vec::new(),
            methods: IndexMap::new(),
            method_interceptors: Vec::new(),
            method_bindings: Vec::new(),
        }
    }

    /// Adds a class-level binding, visible to every chain of the bean.
    pub fn binding(mut self, binding: InterceptorBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Adds an around-invoke interceptor to every business method.
    pub fn interceptor<I: Interceptor>(self, interceptor: I) -> Self {
        self.shared_interceptor(Arc::new(interceptor))
    }

    /// Adds an already shared around-invoke interceptor to every business method.
    pub fn shared_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.class_interceptors.push(interceptor);
        self
    }

    /// Adds an around-construct interceptor.
    pub fn around_construct<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.around_construct.push(Arc::new(interceptor));
        self
    }

    /// Adds a post-construct interceptor.
    pub fn post_construct<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.post_construct.push(Arc::new(interceptor));
        self
    }

    /// Adds a pre-destroy interceptor.
    pub fn pre_destroy<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.pre_destroy.push(Arc::new(interceptor));
        self
    }

    /// Registers an intercepted business method under its handle's name.
    ///
    /// Registering the same name again replaces the handle.
    pub fn method(mut self, handle: MethodHandle) -> Self {
        let name = handle.name().to_string();
        match self.methods.get_mut(&name) {
            Some(entry) => entry.handle = handle,
            None => {
                self.methods.insert(
                    name,
                    MethodEntry {
                        handle,
                        interceptors: Vec::new(),
                        bindings: Vec::new(),
                    },
                );
            }
        }
        self
    }

    /// Adds an around-invoke interceptor to one business method.
    pub fn method_interceptor<I: Interceptor>(mut self, method: &str, interceptor: I) -> Self {
        self.method_interceptors
            .push((method.to_string(), Arc::new(interceptor)));
        self
    }

    /// Adds a binding to one business method.
    pub fn method_binding(mut self, method: &str, binding: InterceptorBinding) -> Self {
        self.method_bindings.push((method.to_string(), binding));
        self
    }

    /// Resolves every chain.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::UnknownMethod` if a method-level interceptor
    /// or binding names a method that was never registered.
    pub fn build(mut self) -> Result<BeanDescriptor, ContainerError> {
        for (method, interceptor) in std::mem::take(&mut self.method_interceptors) {
            self.method_entry(&method)?.interceptors.push(interceptor);
        }
        for (method, binding) in std::mem::take(&mut self.method_bindings) {
            self.method_entry(&method)?.bindings.push(binding);
        }

        let bindings: InterceptorBindings = self.bindings.into_iter().collect();
        let class_interceptors = self.class_interceptors;

        let methods = self
            .methods
            .into_iter()
            .map(|(name, entry)| {
                let interceptors = class_interceptors
                    .iter()
                    .cloned()
                    .chain(entry.interceptors)
                    .collect();
                let method_bindings: InterceptorBindings = entry.bindings.into_iter().collect();
                let metadata = InterceptedMethodMetadata::new(
                    entry.handle,
                    ordered_chain(InterceptionType::AroundInvoke, interceptors),
                    bindings.merged(&method_bindings),
                );
                (name, Arc::new(metadata))
            })
            .collect();

        Ok(BeanDescriptor {
            name: self.name,
            constructor: self.constructor,
            around_construct: ordered_chain(InterceptionType::AroundConstruct, self.around_construct),
            post_construct: ordered_chain(InterceptionType::PostConstruct, self.post_construct),
            pre_destroy: ordered_chain(InterceptionType::PreDestroy, self.pre_destroy),
            bindings,
            methods,
        })
    }

    fn method_entry(&mut self, method: &str) -> Result<&mut MethodEntry, ContainerError> {
        let bean = &self.name;
        self.methods
            .get_mut(method)
            .ok_or_else(|| ContainerError::UnknownMethod {
                bean: bean.clone(),
                method: method.to_string(),
            })
    }
}

impl fmt::Debug for BeanDescriptorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDescriptorBuilder")
            .field("name", &self.name)
            .field("methods", &self.methods.len())
            .finish_non_exhaustive()
    }
}

fn ordered_chain(
    kind: InterceptionType,
    mut interceptors: Vec<Arc<dyn Interceptor>>,
) -> Vec<InterceptorInvocation> {
    interceptors.sort_by_key(|interceptor| interceptor.priority());
    interceptors
        .into_iter()
        .map(|interceptor| InterceptorInvocation::new(kind, interceptor))
        .collect()
}

/// Registry of bean descriptors.
///
/// The container is `Send + Sync`; after registration it can be shared
/// across threads and used to create instances concurrently.
#[derive(Default)]
pub struct Container {
    config: ContainerConfig,
    beans: IndexMap<String, Arc<BeanDescriptor>>,
}

impl Container {
    /// Creates an empty container with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty container with the given settings.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::InvalidConfig` if the settings fail
    /// [`ContainerConfig::validate`].
    pub fn with_config(config: ContainerConfig) -> Result<Self, ContainerError> {
        config
            .validate()
            .map_err(|e| ContainerError::InvalidConfig {
                reason: e.to_string(),
            })?;
        Ok(Self {
            config,
            beans: IndexMap::new(),
        })
    }

    /// Returns the container settings.
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Registers a bean.
    ///
    /// # Errors
    ///
    /// - `ContainerError::DuplicateBean` if the name is taken
    /// - `ContainerError::ChainTooLong` if any chain exceeds
    ///   `max_chain_length`
    pub fn register(&mut self, descriptor: BeanDescriptor) -> Result<(), ContainerError> {
        if self.beans.contains_key(descriptor.name()) {
            return Err(ContainerError::DuplicateBean {
                bean: descriptor.name().to_string(),
            });
        }

        let max = self.config.max_chain_length;
        if let Some((chain, length)) = descriptor.chains().find(|(_, length)| *length > max) {
            return Err(ContainerError::ChainTooLong {
                bean: descriptor.name().to_string(),
                chain: chain.to_string(),
                length,
                max,
            });
        }

        trace!(
            bean = descriptor.name(),
            methods = descriptor.methods.len(),
            "bean registered"
        );
        self.beans
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
        Ok(())
    }

    /// Returns a registered descriptor.
    pub fn descriptor(&self, bean: &str) -> Option<&Arc<BeanDescriptor>> {
        self.beans.get(bean)
    }

    /// Returns true if a bean with this name is registered.
    pub fn contains(&self, bean: &str) -> bool {
        self.beans.contains_key(bean)
    }

    /// Returns the number of registered beans.
    pub fn len(&self) -> usize {
        self.beans.len()
    }

    /// Returns true if no beans are registered.
    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    /// Creates an instance: runs the around-construct chain, then the
    /// post-construct chain on the new instance.
    ///
    /// # Errors
    ///
    /// - `ContainerError::UnknownBean` if `bean` is not registered
    /// - `ContainerError::NotConstructed` if an around-construct interceptor
    ///   returned without the constructor having run
    /// - any failure raised by an interceptor or the constructor, unchanged
    pub fn create(&self, bean: &str, parameters: Vec<Value>) -> InvocationResult<ManagedInstance> {
        let descriptor = self
            .beans
            .get(bean)
            .ok_or_else(|| ContainerError::UnknownBean {
                bean: bean.to_string(),
            })?;

        let constructor = descriptor.constructor.clone();
        let forward = constructor.forward();
        let mut ctx = InvocationContexts::around_construct(
            constructor,
            parameters,
            &descriptor.around_construct,
            forward,
            descriptor.bindings.clone(),
        );
        ctx.proceed()?;

        let instance = ctx
            .into_target()
            .ok_or_else(|| ContainerError::NotConstructed {
                bean: bean.to_string(),
            })?;
        record_lifecycle(bean, InterceptionType::AroundConstruct.name());

        InvocationContexts::post_construct(
            instance.clone(),
            &descriptor.post_construct,
            descriptor.bindings.clone(),
        )
        .proceed()?;
        record_lifecycle(bean, InterceptionType::PostConstruct.name());

        if self.config.log_lifecycle {
            debug!(bean, instance = instance.type_name(), "bean created");
        }

        Ok(ManagedInstance {
            descriptor: Arc::clone(descriptor),
            instance,
            destroyed: AtomicBool::new(false),
            log_lifecycle: self.config.log_lifecycle,
        })
    }

    /// Describes every registered bean and its resolved chains.
    pub fn describe(&self) -> serde_json::Value {
        json!({
            "max_chain_length": self.config.max_chain_length,
            "beans": self.beans.values().map(|d| d.describe()).collect::<Vec<_>>(),
        })
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("config", &self.config)
            .field("beans", &self.beans.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A constructed bean instance.
///
/// Methods can be invoked from several threads at once; each call gets its
/// own invocation context.
pub struct ManagedInstance {
    descriptor: Arc<BeanDescriptor>,
    instance: Value,
    destroyed: AtomicBool,
    log_lifecycle: bool,
}

impl ManagedInstance {
    /// Invokes an intercepted business method.
    ///
    /// # Errors
    ///
    /// - `ContainerError::Destroyed` after [`destroy`](Self::destroy)
    /// - `ContainerError::UnknownMethod` if the method is not intercepted
    /// - any failure raised by the chain or the method, unchanged
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> InvocationResult {
        if self.is_destroyed() {
            return Err(self.destroyed_error().into());
        }

        let metadata =
            self.descriptor
                .method(method)
                .ok_or_else(|| ContainerError::UnknownMethod {
                    bean: self.descriptor.name.clone(),
                    method: method.to_string(),
                })?;

        InvocationContexts::perform_around_invoke(self.instance.clone(), args, metadata)
    }

    /// Runs the pre-destroy chain once.
    ///
    /// The instance counts as destroyed even if the chain fails.
    ///
    /// # Errors
    ///
    /// - `ContainerError::Destroyed` on the second and later calls
    /// - any failure raised by a pre-destroy interceptor, unchanged
    pub fn destroy(&self) -> InvocationResult<()> {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return Err(self.destroyed_error().into());
        }

        let bean = self.descriptor.name.as_str();
        InvocationContexts::pre_destroy(
            self.instance.clone(),
            &self.descriptor.pre_destroy,
            self.descriptor.bindings.clone(),
        )
        .proceed()?;
        record_lifecycle(bean, InterceptionType::PreDestroy.name());

        if self.log_lifecycle {
            debug!(bean, "bean destroyed");
        }
        Ok(())
    }

    /// Returns true once [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Returns the instance.
    pub fn instance(&self) -> &Value {
        &self.instance
    }

    /// Borrows the instance as a `T`.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.instance.downcast_ref()
    }

    /// Returns the bean descriptor.
    pub fn descriptor(&self) -> &BeanDescriptor {
        &self.descriptor
    }

    fn destroyed_error(&self) -> ContainerError {
        ContainerError::Destroyed {
            bean: self.descriptor.name.clone(),
        }
    }
}

impl fmt::Debug for ManagedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedInstance")
            .field("bean", &self.descriptor.name)
            .field("instance", &self.instance)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
