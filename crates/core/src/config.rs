//! Dashboard configuration
//!
//! Everything a controller needs to know about its surroundings is passed in
//! through [`DashboardConfig`] at construction time: color thresholds, the
//! server endpoint paths, the page URLs used for cross-view navigation and
//! the size of the area charts are drawn into.

use crate::error::{Error, Result};
use crate::event::Endpoint;
use serde::{Deserialize, Serialize};

/// Significance thresholds (in percent) for the changes table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Threshold for the change over the previous result
    pub change: f64,
    /// Threshold for the change over the trend window
    pub trend: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            change: 3.0,
            trend: 4.0,
        }
    }
}

impl Thresholds {
    /// Create thresholds, rejecting negative or non-finite values
    pub fn new(change: f64, trend: f64) -> Result<Self> {
        let thresholds = Self { change, trend };
        thresholds.validate()?;
        Ok(thresholds)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [("change", self.change), ("trend", self.trend)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::ConfigError(format!(
                    "{} threshold must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Server endpoint paths, relative to the server base URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    pub table: String,
    pub comparison: String,
    pub timeline: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            table: "changes/table/".to_string(),
            comparison: "comparison/json/".to_string(),
            timeline: "timeline/json/".to_string(),
        }
    }
}

/// Page URLs used by click-to-navigate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageUrls {
    pub changes: String,
    pub timeline: String,
}

impl Default for PageUrls {
    fn default() -> Self {
        Self {
            changes: "changes/".to_string(),
            timeline: "timeline/".to_string(),
        }
    }
}

/// Pixel dimensions of the drawing area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width of the plot container
    pub width: f64,
    /// Default height of a single plot
    pub plot_height: f64,
    /// Height of the content area, used to size placeholders
    pub content_height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 900.0,
            plot_height: 500.0,
            content_height: 500.0,
        }
    }
}

/// Configuration shared by all controllers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub thresholds: Thresholds,
    pub endpoints: Endpoints,
    pub pages: PageUrls,
    pub viewport: Viewport,
}

impl DashboardConfig {
    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        if !(self.viewport.width.is_finite() && self.viewport.width > 0.0) {
            return Err(Error::ConfigError(
                "viewport width must be greater than 0".to_string(),
            ));
        }
        if !(self.viewport.plot_height.is_finite() && self.viewport.plot_height > 0.0) {
            return Err(Error::ConfigError(
                "plot height must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Path of the server endpoint for a request
    pub fn endpoint_path(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Table => &self.endpoints.table,
            Endpoint::Comparison => &self.endpoints.comparison,
            Endpoint::Timeline => &self.endpoints.timeline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let thresholds = Thresholds::default();
        assert_eq!(thresholds.change, 3.0);
        assert_eq!(thresholds.trend, 4.0);
    }

    #[test]
    fn test_thresholds_reject_negative() {
        assert!(Thresholds::new(-1.0, 4.0).is_err());
        assert!(Thresholds::new(3.0, f64::NAN).is_err());
        assert!(Thresholds::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_validate_viewport() {
        let mut config = DashboardConfig::default();
        assert!(config.validate().is_ok());

        config.viewport.width = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoint_path() {
        let config = DashboardConfig::default();
        assert_eq!(config.endpoint_path(Endpoint::Timeline), "timeline/json/");
        assert_eq!(config.endpoint_path(Endpoint::Table), "changes/table/");
    }
}
