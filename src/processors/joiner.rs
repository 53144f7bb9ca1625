use crate::error::{LoaderError, Result};
use crate::models::{HourlyObservation, WeatherRecord};
use crate::processors::report::PipelineCounters;
use crate::readers::StationIndex;
use std::sync::Arc;
use tracing::debug;

/// Strict inner join of an observation stream against the station index.
///
/// Lines that fail to parse and observations whose WBAN has no station are
/// dropped and counted; everything else is joined into a `WeatherRecord`.
/// Output order equals input file order and nothing is buffered beyond the
/// record in flight.
pub struct JoinedStream<I> {
    observations: I,
    index: Arc<StationIndex>,
    counters: Arc<PipelineCounters>,
}

impl<I> JoinedStream<I>
where
    I: Iterator<Item = Result<HourlyObservation>>,
{
    pub fn new(
        observations: I,
        index: Arc<StationIndex>,
        counters: Arc<PipelineCounters>,
    ) -> Self {
        Self {
            observations,
            index,
            counters,
        }
    }
}

impl<I> Iterator for JoinedStream<I>
where
    I: Iterator<Item = Result<HourlyObservation>>,
{
    type Item = Result<WeatherRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let observation = match self.observations.next()? {
                Ok(observation) => {
                    self.counters.record_line();
                    observation
                }
                Err(LoaderError::InvalidFormat(reason)) => {
                    self.counters.record_line();
                    self.counters.record_parse_skip();
                    debug!(%reason, "skipping invalid observation line");
                    continue;
                }
                // Anything that is not a line-level problem is fatal.
                Err(e) => return Some(Err(e)),
            };

            match self.index.get(&observation.wban) {
                Some(station) => {
                    return Some(Ok(WeatherRecord::from_parts(station.clone(), observation)))
                }
                None => {
                    self.counters.record_unmatched();
                    debug!(wban = %observation.wban, "no station for observation");
                    continue;
                }
            }
        }
    }
}
