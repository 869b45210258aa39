//! Invoker contract and the FIFO worker-thread implementation.

mod async_invoker;
mod invoke_item;
mod invoker_config;
mod simple_async_invoker;

pub use async_invoker::{AsyncInvoker, InvokerRef, InvokerTask, call_with};
pub(crate) use invoke_item::InvokeItem;
pub use invoker_config::InvokerConfig;
pub use simple_async_invoker::SimpleAsyncInvoker;
