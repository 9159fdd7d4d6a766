//! Window reconciliation against measured asset durations.
//!
//! A nominal window only ever grows: it is stretched to host the measured
//! asset plus a safety margin and never drops below its minimum hold.
//! Reconciled windows are then laid end to end and their sum becomes the
//! new total output duration.

use tracing::debug;

use crate::error::{TimelineError, TimelineResult};

/// `max(nominal, minimum_hold, measured + safety_margin)`.
///
/// ```
/// use reelsync_timeline::reconcile::reconcile;
/// assert!((reconcile(3.0, 4.2, 0.3, 2.0) - 4.5).abs() < 1e-9);
/// assert_eq!(reconcile(6.0, 1.0, 0.3, 2.0), 6.0);
/// ```
pub fn reconcile(nominal: f64, measured: f64, safety_margin: f64, minimum_hold: f64) -> f64 {
    nominal.max(minimum_hold).max(measured + safety_margin)
}

/// Anchor for content placed `lead` seconds before the end.
pub fn anchor_before_end(total: f64, lead: f64) -> f64 {
    (total - lead).max(0.0)
}

/// A window to reconcile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowRequest {
    pub nominal_secs: f64,
    pub min_hold_secs: f64,
    /// Measured length of the hosted asset, if any
    pub measured_secs: Option<f64>,
}

/// A reconciled window on the output timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }
}

/// Reconciled windows laid end to end.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowLayout {
    pub windows: Vec<Window>,
    pub total_secs: f64,
}

impl WindowLayout {
    /// Spans each window owns on the visual track: from its start to the
    /// next window's start (the last runs to the total), so buffers are
    /// held by the preceding window.
    pub fn spans(&self) -> Vec<Window> {
        self.windows
            .iter()
            .enumerate()
            .map(|(i, w)| Window {
                start: w.start,
                end: self
                    .windows
                    .get(i + 1)
                    .map(|next| next.start)
                    .unwrap_or(self.total_secs),
            })
            .collect()
    }
}

/// Applies the reconciliation policy to a sequence of windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationReconciler {
    pub safety_margin_secs: f64,
    /// Fixed buffer inserted between consecutive windows
    pub buffer_secs: f64,
}

impl DurationReconciler {
    pub fn new(safety_margin_secs: f64) -> Self {
        Self {
            safety_margin_secs,
            buffer_secs: 0.0,
        }
    }

    pub fn with_buffer(mut self, buffer_secs: f64) -> Self {
        self.buffer_secs = buffer_secs;
        self
    }

    /// Reconcile one window. `index` is only used in errors.
    pub fn reconcile(&self, index: usize, request: &WindowRequest) -> TimelineResult<f64> {
        if !request.nominal_secs.is_finite() || request.nominal_secs < 0.0 {
            return Err(TimelineError::configuration(format!(
                "window {} has invalid nominal length {}",
                index, request.nominal_secs
            )));
        }
        if !request.min_hold_secs.is_finite() || request.min_hold_secs < 0.0 {
            return Err(TimelineError::configuration(format!(
                "window {} has invalid minimum hold {}",
                index, request.min_hold_secs
            )));
        }

        let measured = match request.measured_secs {
            Some(d) if !d.is_finite() || d <= 0.0 => {
                return Err(TimelineError::InvalidNarrationDuration {
                    index,
                    duration_secs: d,
                });
            }
            Some(d) => d + self.safety_margin_secs,
            None => 0.0,
        };

        let length = request.nominal_secs.max(request.min_hold_secs).max(measured);
        if length <= 0.0 {
            return Err(TimelineError::configuration(format!(
                "window {} reconciles to zero length",
                index
            )));
        }
        Ok(length)
    }

    /// Reconcile every window and lay them end to end from 0.
    pub fn lay_out(&self, requests: &[WindowRequest]) -> TimelineResult<WindowLayout> {
        let mut windows = Vec::with_capacity(requests.len());
        let mut cursor = 0.0;
        for (i, request) in requests.iter().enumerate() {
            if i > 0 {
                cursor += self.buffer_secs;
            }
            let length = self.reconcile(i, request)?;
            if length > request.nominal_secs {
                debug!(
                    window = i,
                    nominal_secs = request.nominal_secs,
                    reconciled_secs = length,
                    "Window stretched to fit narration"
                );
            }
            windows.push(Window {
                start: cursor,
                end: cursor + length,
            });
            cursor += length;
        }
        Ok(WindowLayout {
            windows,
            total_secs: cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(nominal: f64, hold: f64, measured: Option<f64>) -> WindowRequest {
        WindowRequest {
            nominal_secs: nominal,
            min_hold_secs: hold,
            measured_secs: measured,
        }
    }

    #[test]
    fn test_reconcile_policy() {
        let r = DurationReconciler::new(0.3);
        assert!((r.reconcile(0, &req(3.0, 2.0, Some(4.2))).unwrap() - 4.5).abs() < 1e-9);
        assert_eq!(r.reconcile(0, &req(3.0, 5.0, Some(1.0))).unwrap(), 5.0);
        assert_eq!(r.reconcile(0, &req(3.0, 2.0, None)).unwrap(), 3.0);
    }

    #[test]
    fn test_non_positive_measured_is_failure() {
        let r = DurationReconciler::new(0.3);
        assert_eq!(
            r.reconcile(2, &req(3.0, 2.0, Some(0.0))),
            Err(TimelineError::InvalidNarrationDuration {
                index: 2,
                duration_secs: 0.0
            })
        );
        assert!(r.reconcile(0, &req(3.0, 2.0, Some(-1.0))).is_err());
    }

    #[test]
    fn test_zero_window_rejected() {
        let r = DurationReconciler::new(0.3);
        assert!(matches!(
            r.reconcile(0, &req(0.0, 0.0, None)),
            Err(TimelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_lay_out_end_to_end() {
        let layout = DurationReconciler::new(0.5)
            .lay_out(&[req(0.0, 3.0, Some(4.0)), req(0.0, 3.0, None), req(5.0, 3.0, Some(1.0))])
            .unwrap();
        assert_eq!(
            layout.windows,
            vec![
                Window { start: 0.0, end: 4.5 },
                Window { start: 4.5, end: 7.5 },
                Window { start: 7.5, end: 12.5 },
            ]
        );
        assert_eq!(layout.total_secs, 12.5);
    }

    #[test]
    fn test_lay_out_with_buffer() {
        let layout = DurationReconciler::new(0.0)
            .with_buffer(1.0)
            .lay_out(&[req(2.0, 0.0, None), req(3.0, 0.0, None)])
            .unwrap();
        assert_eq!(layout.windows[1], Window { start: 3.0, end: 6.0 });
        assert_eq!(layout.total_secs, 6.0);
        let spans = layout.spans();
        assert_eq!(spans[0], Window { start: 0.0, end: 3.0 });
        assert_eq!(spans[1], Window { start: 3.0, end: 6.0 });
    }

    #[test]
    fn test_anchor_before_end() {
        assert_eq!(anchor_before_end(30.0, 5.0), 25.0);
        assert_eq!(anchor_before_end(3.0, 5.0), 0.0);
    }
}
