/// Capture word framing.
///
/// Provides [`Tick`](capture::Tick), the three characters of one pixel clock,
/// and the [`CaptureReader`](capture::CaptureReader) that splits raw capture
/// bytes into ticks.
pub mod capture;

/// Stream state machine, timing checks and frame assembly.
///
/// Provides the [`StreamValidator`](validate::StreamValidator) that consumes
/// characters one pixel clock at a time and hands out
/// [`Frame`](crate::structs::frame::Frame)s at vertical sync edges.
pub mod validate;

/// Reference encoder and test pattern generation.
///
/// Provides the [`TmdsEncoder`](encode::TmdsEncoder), configurable
/// [`VideoTiming`](encode::VideoTiming) and the
/// [`TestPatternSource`](encode::TestPatternSource) character stream.
pub mod encode;
