//! Handler registry and dispatcher.

use crate::handler::*;
use crate::metrics::Metrics;
use skybook_core::FlightManagementService;
use skybook_protocol::{DomainMapper, Encoder, Message, MessageKind, WireMessage};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A response ready to be written: the message and its encoded line.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub message: Message,
    /// Encoded form of `message`, including the trailing `\n`.
    pub line: Vec<u8>,
}

/// Type-erased entry point of one registered handler.
///
/// Returns `None` only if the message is not the shape the handler was
/// registered for, or if not even the fallback response can be encoded.
pub type HandlerFn =
    fn(Message, &dyn FlightManagementService, &dyn DomainMapper) -> Option<Reply>;

/// Maps each command shape to exactly one handler.
///
/// Built once and read concurrently afterwards.
pub struct HandlerRegistry {
    handlers: HashMap<MessageKind, HandlerFn>,
}

impl HandlerRegistry {
    /// Creates a registry with a handler for every command shape.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<CreateFlightHandler>();
        registry.register::<CreateAirplaneHandler>();
        registry.register::<CreateScheduledFlightHandler>();
        registry.register::<CreateBookingHandler>();
        registry.register::<FindFlightHandler>();
        registry.register::<FindAirplaneHandler>();
        registry.register::<FindScheduledFlightHandler>();
        registry.register::<GetFlightsHandler>();
        registry.register::<GetAirplanesHandler>();
        registry.register::<GetScheduledFlightsHandler>();
        registry
    }

    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `H` for its command shape, replacing any previous handler.
    pub fn register<H: CommandHandler>(&mut self) {
        self.handlers.insert(H::Command::KIND, dispatch::<H>);
    }

    pub fn find_handler(&self, kind: MessageKind) -> Option<HandlerFn> {
        self.handlers.get(&kind).copied()
    }

    /// Returns the registered shapes in declaration order.
    pub fn kinds(&self) -> Vec<MessageKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the handler registered for the message's shape.
    ///
    /// Returns `None` when no handler is registered.
    pub fn dispatch(
        &self,
        message: Message,
        service: &dyn FlightManagementService,
        mapper: &dyn DomainMapper,
    ) -> Option<Reply> {
        let handler = self.find_handler(message.kind())?;
        handler(message, service, mapper)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch<H: CommandHandler>(
    message: Message,
    service: &dyn FlightManagementService,
    mapper: &dyn DomainMapper,
) -> Option<Reply> {
    let command = H::Command::try_from(message).ok()?;

    let response =
        match panic::catch_unwind(AssertUnwindSafe(|| H::handle(&command, service, mapper))) {
            Ok(response) => response,
            Err(_) => {
                tracing::error!("Handler for {} panicked, sending fallback", H::Command::KIND);
                H::fallback(&command)
            }
        };

    let message: Message = response.into();
    match Encoder::encode_line(&message) {
        Ok(line) => Some(Reply { message, line }),
        Err(e) => {
            tracing::warn!(
                "Cannot send {} ({}), sending fallback",
                message.kind(),
                e
            );
            let fallback: Message = H::fallback(&command).into();
            match Encoder::encode_line(&fallback) {
                Ok(line) => Some(Reply {
                    message: fallback,
                    line,
                }),
                Err(e) => {
                    tracing::error!("Fallback for {} cannot be encoded: {}", H::Command::KIND, e);
                    None
                }
            }
        }
    }
}

/// Dispatches decoded messages against a service, recording metrics.
pub struct Dispatcher {
    registry: HandlerRegistry,
    service: Arc<dyn FlightManagementService>,
    mapper: Arc<dyn DomainMapper>,
    metrics: Option<Arc<Metrics>>,
}

impl Dispatcher {
    pub fn new(service: Arc<dyn FlightManagementService>, mapper: Arc<dyn DomainMapper>) -> Self {
        Self {
            registry: HandlerRegistry::new(),
            service,
            mapper,
            metrics: None,
        }
    }

    /// Sets the metrics instance.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> Option<&Arc<Metrics>> {
        self.metrics.as_ref()
    }

    /// Handles one decoded message.
    ///
    /// Returns `None` for shapes without a handler; the caller must not
    /// answer those.
    pub fn dispatch(&self, message: Message) -> Option<Reply> {
        let kind = message.kind();
        let timer = self.metrics.as_ref().map(|m| {
            m.command_duration
                .with_label_values(&[kind.name()])
                .start_timer()
        });

        let reply = self
            .registry
            .dispatch(message, self.service.as_ref(), self.mapper.as_ref())?;
        drop(timer);

        if let Some(ref metrics) = self.metrics {
            metrics.commands_total.with_label_values(&[kind.name()]).inc();
            if let Some(code) = reply.message.error_label() {
                metrics.command_errors_total.with_label_values(&[code]).inc();
            }
        }

        Some(reply)
    }

    /// Records a line that was dropped without a response.
    pub fn record_skipped(&self, reason: &str) {
        if let Some(ref metrics) = self.metrics {
            metrics
                .skipped_messages_total
                .with_label_values(&[reason])
                .inc();
        }
    }
}
