pub mod observation;
pub mod row;
pub mod station;
pub mod weather;

pub use observation::HourlyObservation;
pub use row::WeatherRow;
pub use station::Station;
pub use weather::WeatherRecord;
