//! Pipeline assembly and execution.
//!
//! A pipeline is producer -> transformer(s) -> consumer, assembled through a
//! typestate builder so incomplete pipelines do not compile. Streams are
//! composed eagerly as stages are added; `run` drives the composed stream
//! through the consumer's lifecycle (`open`, `consume`, `close`) and `spawn`
//! runs the same thing on a task under a cancellation token.

use crate::error::PipelineError;
use crate::{consumer::Consumer, producer::Producer, transformer::Transformer};
use std::marker::PhantomData;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// State types for the builder
pub struct Empty;
pub struct HasProducer<P>(PhantomData<P>);
pub struct HasTransformer<P, T>(PhantomData<(P, T)>);

/// Pipeline builder parameterized over how much of the pipeline exists.
pub struct PipelineBuilder<State> {
  producer_stream: Option<Box<dyn std::any::Any + Send + 'static>>,
  transformer_stream: Option<Box<dyn std::any::Any + Send + 'static>>,
  _state: State,
}

/// A fully assembled pipeline, ready to run once.
pub struct Pipeline<T, C>
where
  T: Transformer,
  C: Consumer,
  T::Input: std::fmt::Debug + Clone + Send + Sync + 'static,
  T::Output: std::fmt::Debug + Clone + Send + Sync + 'static,
  C::Input: std::fmt::Debug + Clone + Send + Sync + 'static,
{
  transformer_stream: Option<T::OutputStream>,
  consumer: Option<C>,
}

impl PipelineBuilder<Empty> {
  pub fn new() -> Self {
    PipelineBuilder {
      producer_stream: None,
      transformer_stream: None,
      _state: Empty,
    }
  }

  pub fn producer<P>(mut self, mut producer: P) -> PipelineBuilder<HasProducer<P>>
  where
    P: Producer + 'static,
    P::Output: std::fmt::Debug + Clone + Send + Sync + 'static,
    P::OutputStream: 'static,
  {
    let stream = producer.produce();
    self.producer_stream = Some(Box::new(stream));

    PipelineBuilder {
      producer_stream: self.producer_stream,
      transformer_stream: None,
      _state: HasProducer(PhantomData),
    }
  }
}

impl Default for PipelineBuilder<Empty> {
  fn default() -> Self {
    Self::new()
  }
}

impl<P> PipelineBuilder<HasProducer<P>>
where
  P: Producer + 'static,
  P::Output: std::fmt::Debug + Clone + Send + Sync + 'static,
  P::OutputStream: 'static,
{
  pub fn transformer<T>(mut self, mut transformer: T) -> PipelineBuilder<HasTransformer<P, T>>
  where
    T: Transformer + 'static,
    T::Input: std::fmt::Debug + Clone + Send + Sync + 'static,
    T::Output: std::fmt::Debug + Clone + Send + Sync + 'static,
    T::InputStream: From<P::OutputStream>,
    T::OutputStream: 'static,
  {
    let producer_stream = self
      .producer_stream
      .take()
      .unwrap()
      .downcast::<P::OutputStream>()
      .unwrap();

    let transformer_stream = transformer.transform((*producer_stream).into());
    self.transformer_stream = Some(Box::new(transformer_stream));

    PipelineBuilder {
      producer_stream: None,
      transformer_stream: self.transformer_stream,
      _state: HasTransformer(PhantomData),
    }
  }
}

impl<P, T> PipelineBuilder<HasTransformer<P, T>>
where
  P: Producer + 'static,
  T: Transformer + 'static,
  P::Output: std::fmt::Debug + Clone + Send + Sync + 'static,
  T::Input: std::fmt::Debug + Clone + Send + Sync + 'static,
  T::Output: std::fmt::Debug + Clone + Send + Sync + 'static,
  T::OutputStream: 'static,
{
  pub fn transformer<U>(mut self, mut transformer: U) -> PipelineBuilder<HasTransformer<P, U>>
  where
    U: Transformer + 'static,
    U::Input: std::fmt::Debug + Clone + Send + Sync + 'static,
    U::Output: std::fmt::Debug + Clone + Send + Sync + 'static,
    U::InputStream: From<T::OutputStream>,
    U::OutputStream: 'static,
  {
    let transformer_stream = self
      .transformer_stream
      .take()
      .unwrap()
      .downcast::<T::OutputStream>()
      .unwrap();

    let new_stream = transformer.transform((*transformer_stream).into());
    self.transformer_stream = Some(Box::new(new_stream));

    PipelineBuilder {
      producer_stream: None,
      transformer_stream: self.transformer_stream,
      _state: HasTransformer(PhantomData),
    }
  }

  pub fn consumer<C>(mut self, consumer: C) -> Pipeline<T, C>
  where
    C: Consumer + 'static,
    C::Input: std::fmt::Debug + Clone + Send + Sync + 'static,
    C::InputStream: From<T::OutputStream>,
  {
    let transformer_stream = self
      .transformer_stream
      .take()
      .unwrap()
      .downcast::<T::OutputStream>()
      .unwrap();

    Pipeline {
      transformer_stream: Some(*transformer_stream),
      consumer: Some(consumer),
    }
  }
}

impl<T, C> Pipeline<T, C>
where
  T: Transformer,
  C: Consumer + Send,
  T::Input: std::fmt::Debug + Clone + Send + Sync + 'static,
  T::Output: std::fmt::Debug + Clone + Send + Sync + 'static,
  C::Input: std::fmt::Debug + Clone + Send + Sync + 'static,
  C::InputStream: From<T::OutputStream>,
{
  /// Runs the pipeline to completion and returns the consumer.
  ///
  /// The consumer's lifecycle is honored strictly: a failed `open` aborts the
  /// run before any item is taken from the stream, and `close` runs only
  /// after the stream is fully drained.
  pub async fn run(mut self) -> Result<C, PipelineError> {
    let transformer_stream = self.transformer_stream.take().unwrap();
    let mut consumer = self.consumer.take().unwrap();
    let component = consumer.component_info().name;

    if let Err(e) = consumer.open().await {
      error!(component = %component, error = %e, "consumer failed to open");
      return Err(PipelineError::Open(e));
    }
    consumer.consume(transformer_stream.into()).await;
    if let Err(e) = consumer.close().await {
      error!(component = %component, error = %e, "consumer failed to close");
      return Err(PipelineError::Close(e));
    }
    info!(component = %component, "pipeline finished");
    Ok(consumer)
  }

  /// Runs the pipeline on its own task until it finishes or `cancel` fires.
  ///
  /// Cancellation is abandonment, not draining: in-flight items are dropped
  /// and the task resolves to [`PipelineError::Cancelled`].
  pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Result<C, PipelineError>>
  where
    T: Send + 'static,
    T::OutputStream: Send + 'static,
    C: Send + 'static,
  {
    tokio::spawn(async move {
      tokio::select! {
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        result = self.run() => result,
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consumers::VecConsumer;
  use crate::producers::WordProducer;
  use crate::transformers::SuffixTransformer;
  use crate::{
    consumer::{Consumer, ConsumerConfig},
    input::Input,
    output::Output,
    producer::{Producer, ProducerConfig},
    transformer::{Transformer, TransformerConfig},
  };
  use async_trait::async_trait;
  use futures::{Stream, StreamExt};
  use std::error::Error;
  use std::pin::Pin;
  use std::time::Duration;

  #[derive(Clone)]
  struct NumberProducer {
    numbers: Vec<i32>,
    config: ProducerConfig<i32>,
  }

  impl NumberProducer {
    fn new(numbers: Vec<i32>) -> Self {
      Self {
        numbers,
        config: ProducerConfig::default(),
      }
    }
  }

  impl Output for NumberProducer {
    type Output = i32;
    type OutputStream = Pin<Box<dyn Stream<Item = i32> + Send>>;
  }

  impl Producer for NumberProducer {
    fn produce(&mut self) -> Self::OutputStream {
      Box::pin(futures::stream::iter(self.numbers.clone()))
    }

    fn set_config_impl(&mut self, config: ProducerConfig<i32>) {
      self.config = config;
    }

    fn get_config_impl(&self) -> &ProducerConfig<i32> {
      &self.config
    }

    fn get_config_mut_impl(&mut self) -> &mut ProducerConfig<i32> {
      &mut self.config
    }
  }

  #[derive(Clone)]
  struct AddTransformer {
    value: i32,
    config: TransformerConfig<i32>,
  }

  impl AddTransformer {
    fn new(value: i32) -> Self {
      Self {
        value,
        config: TransformerConfig::default(),
      }
    }
  }

  impl Input for AddTransformer {
    type Input = i32;
    type InputStream = Pin<Box<dyn Stream<Item = i32> + Send>>;
  }

  impl Output for AddTransformer {
    type Output = i32;
    type OutputStream = Pin<Box<dyn Stream<Item = i32> + Send>>;
  }

  impl Transformer for AddTransformer {
    fn transform(&mut self, input: Self::InputStream) -> Self::OutputStream {
      let value = self.value;
      Box::pin(input.map(move |x| x + value))
    }

    fn set_config_impl(&mut self, config: TransformerConfig<i32>) {
      self.config = config;
    }

    fn get_config_impl(&self) -> &TransformerConfig<i32> {
      &self.config
    }

    fn get_config_mut_impl(&mut self) -> &mut TransformerConfig<i32> {
      &mut self.config
    }
  }

  struct RefusingConsumer {
    config: ConsumerConfig<i32>,
  }

  impl Input for RefusingConsumer {
    type Input = i32;
    type InputStream = Pin<Box<dyn Stream<Item = i32> + Send>>;
  }

  #[async_trait]
  impl Consumer for RefusingConsumer {
    async fn open(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
      Err(Box::new(crate::error::StringError(
        "destination rejected".to_string(),
      )))
    }

    async fn consume(&mut self, _stream: Self::InputStream) {
      panic!("consume must not run after a failed open");
    }

    fn set_config_impl(&mut self, config: ConsumerConfig<i32>) {
      self.config = config;
    }

    fn get_config_impl(&self) -> &ConsumerConfig<i32> {
      &self.config
    }

    fn get_config_mut_impl(&mut self) -> &mut ConsumerConfig<i32> {
      &mut self.config
    }
  }

  #[tokio::test]
  async fn run_returns_the_consumer() {
    let pipeline = PipelineBuilder::new()
      .producer(NumberProducer::new(vec![1, 2, 3]))
      .transformer(AddTransformer::new(10))
      .consumer(VecConsumer::new());

    let consumer = pipeline.run().await.unwrap();
    assert_eq!(consumer.into_items(), vec![11, 12, 13]);
  }

  #[tokio::test]
  async fn transformers_chain_in_order() {
    let pipeline = PipelineBuilder::new()
      .producer(NumberProducer::new(vec![1, 2, 3]))
      .transformer(AddTransformer::new(1))
      .transformer(AddTransformer::new(100))
      .consumer(VecConsumer::new());

    let consumer = pipeline.run().await.unwrap();
    assert_eq!(consumer.into_items(), vec![102, 103, 104]);
  }

  #[tokio::test]
  async fn empty_stream_completes_cleanly() {
    let pipeline = PipelineBuilder::new()
      .producer(NumberProducer::new(vec![]))
      .transformer(AddTransformer::new(1))
      .consumer(VecConsumer::new());

    let consumer = pipeline.run().await.unwrap();
    assert!(consumer.into_items().is_empty());
  }

  #[tokio::test]
  async fn failed_open_aborts_before_consuming() {
    let pipeline = PipelineBuilder::new()
      .producer(NumberProducer::new(vec![1, 2, 3]))
      .transformer(AddTransformer::new(0))
      .consumer(RefusingConsumer {
        config: ConsumerConfig::default(),
      });

    let result = pipeline.run().await;
    assert!(matches!(result, Err(PipelineError::Open(_))));
  }

  #[tokio::test]
  async fn spawned_pipeline_is_cancellable() {
    // Unbounded producer; only cancellation can end this pipeline.
    let pipeline = PipelineBuilder::new()
      .producer(WordProducer::new().with_interval(Duration::from_millis(5)))
      .transformer(SuffixTransformer::new())
      .consumer(VecConsumer::new());

    let cancel = CancellationToken::new();
    let handle = pipeline.spawn(cancel.clone());
    tokio::time::sleep(Duration::from_millis(30)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_millis(500), handle)
      .await
      .expect("cancellation must end the task")
      .unwrap();
    assert!(matches!(result, Err(PipelineError::Cancelled)));
  }

  #[tokio::test]
  async fn bounded_word_pipeline_runs_to_completion() {
    let pipeline = PipelineBuilder::new()
      .producer(
        WordProducer::new()
          .with_interval(Duration::from_millis(1))
          .with_count(5),
      )
      .transformer(SuffixTransformer::new())
      .consumer(VecConsumer::new());

    let consumer = pipeline.run().await.unwrap();
    let items = consumer.into_items();
    assert_eq!(items.len(), 5);
    assert!(items.iter().all(|r| r.word.ends_with("!!!")));
  }
}
