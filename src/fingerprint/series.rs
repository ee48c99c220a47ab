//! Ordered, duplicate-free candle series.

use std::collections::BTreeMap;

use crate::error::CatalogError;
use crate::fingerprint::candle::Candle;

/// A time-ordered run of candles with strictly increasing timestamps.
///
/// Immutable once constructed; every fingerprinting pass over it reads the
/// same slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Takes candles that are already sorted ascending with no repeated
    /// timestamps. Anything else is an `InputOrdering` error.
    pub fn new(candles: Vec<Candle>) -> Result<Self, CatalogError> {
        for (index, candle) in candles.iter().enumerate() {
            candle
                .validate()
                .map_err(|reason| CatalogError::InvalidCandle { index, reason })?;
        }

        if let Some(index) = candles
            .windows(2)
            .position(|pair| pair[1].get_timestamp() <= pair[0].get_timestamp())
        {
            return Err(CatalogError::InputOrdering {
                index: index + 1,
                previous: candles[index].get_timestamp(),
                current: candles[index + 1].get_timestamp(),
            });
        }

        Ok(Self { candles })
    }

    /// Sorts candles by timestamp and collapses duplicates, keeping the
    /// last candle seen for each timestamp.
    pub fn merged(candles: impl IntoIterator<Item = Candle>) -> Result<Self, CatalogError> {
        let by_timestamp: BTreeMap<_, _> = candles
            .into_iter()
            .map(|candle| (candle.get_timestamp(), candle))
            .collect();
        Self::new(by_timestamp.into_values().collect())
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }
}
