//! Single forward pass over the products a predicate set matched.

use crate::catalog::{Channel, Product};
use crate::query::ProductStream;
use anyhow::{Context, Result};
use indicatif::ProgressBar;

/// Converts measured values of a product into the channel's units, in place.
pub trait UnitConverter {
    fn convert(&self, product: &mut Product, channel: &Channel) -> Result<()>;
}

/// Lazy cursor: every yielded product is counted and unit-converted first.
/// Fused after end-of-stream or the first error.
pub struct RecordCursor<'a> {
    inner: Option<ProductStream>,
    converter: &'a dyn UnitConverter,
    channel: Channel,
    read: u64,
    pb: Option<ProgressBar>,
}

impl<'a> RecordCursor<'a> {
    pub fn open(stream: ProductStream, converter: &'a dyn UnitConverter, channel: Channel) -> Self {
        Self { inner: Some(stream), converter, channel, read: 0, pb: None }
    }

    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.pb = Some(pb);
        self
    }

    /// Products yielded so far.
    pub fn read_count(&self) -> u64 {
        self.read
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    fn advance(&mut self) -> Option<Result<Product>> {
        let stream = self.inner.as_mut()?;
        let mut product = match stream.next() {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                self.inner = None;
                return Some(Err(e.context("reading next product")));
            }
            None => {
                self.inner = None;
                if let Some(pb) = &self.pb {
                    pb.finish_with_message(format!("read {} products", self.read));
                }
                return None;
            }
        };

        self.read += 1;
        if let Some(pb) = &self.pb {
            pb.inc(1);
        }

        if let Err(e) = self
            .converter
            .convert(&mut product, &self.channel)
            .with_context(|| format!("converting units of product '{}'", product.identifier))
        {
            self.inner = None;
            return Some(Err(e));
        }
        Some(Ok(product))
    }
}

impl Iterator for RecordCursor<'_> {
    type Item = Result<Product>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

impl std::iter::FusedIterator for RecordCursor<'_> {}
