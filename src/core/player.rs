//! Player orchestrator: one transport session, its position reconciliation
//! and the live-edited filter chain.
//!
//! **Architecture**: Player does NOT own the statistics model's meaning, only
//! a handle to it through [`FrameModel`]. The host calls the operator methods
//! below, calls [`Player::pump_events`] and [`Player::tick`] from its update
//! loop, and reacts to events on the [`EventBus`].
//!
//! # Update loop
//!
//! ```ignore
//! bus.subscribe::<PlaybackEndedEvent, _>(|e| info!("Stopped at end, frame {}", e.frame));
//! loop {
//!     player.pump_events();          // transport -> slider/model
//!     player.tick()?;                // debounced filter reapplication
//!     for event in bus.poll() { ... }
//! }
//! ```
//!
//! # Filter edits
//!
//! Every edit re-arms the debounce timer. When it fires the graph is rebuilt
//! and installed; a paused session is then reloaded and parked back on the
//! slider position so the new graph shows the same frame.

use crossbeam_channel::Receiver;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::debounced_apply::{DebouncedApply, DEFAULT_APPLY_DELAY};
use super::event_bus::EventBus;
use super::frame_model::FrameModel;
use super::mapper::FrameTimeMapper;
use super::output_scale::OutputScale;
use super::player_events::{CursorMovedEvent, FilterGraphAppliedEvent, PlaybackStateChangedEvent};
use super::reconciler::{DEFAULT_SEEK_BACK_FRAMES, Outcome, PositionReconciler, PositionSlider};
use super::sync::{SyncConfig, SyncError, TransportSync};
use super::transport::{PlaybackState, StepDirection, Transport, TransportError, TransportEvent};
use crate::filters::{
    ChainError, FilterChain, FontResource, GraphOptions, LayoutMode, SlotId, TokenContext, compose,
};
use crate::media::MediaInfo;
use crate::timecode::parse_time_ms;

/// Filters selected when a file is opened.
pub const DEFAULT_FILTERS: [&str; 4] = ["Normal", "Waveform", "Bit Plane (10 slices)", "Vectorscope"];

/// Default playback speed.
pub const DEFAULT_SPEED_PERCENT: u32 = 100;

#[derive(Debug)]
pub enum PlayerError {
    Sync(SyncError),
    Load(TransportError),
}

impl std::fmt::Display for PlayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerError::Sync(e) => write!(f, "{}", e),
            PlayerError::Load(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PlayerError {}

impl From<SyncError> for PlayerError {
    fn from(e: SyncError) -> Self {
        PlayerError::Sync(e)
    }
}

impl From<TransportError> for PlayerError {
    fn from(e: TransportError) -> Self {
        PlayerError::Load(e)
    }
}

/// Construction-time settings.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub sync: SyncConfig,
    pub seek_back_frames: usize,
    pub apply_delay: Duration,
    pub speed_percent: u32,
    pub graph: GraphOptions,
    /// Per-slot filters selected on file open
    pub default_filters: Vec<Option<String>>,
    pub default_adjustment: Option<String>,
    pub output_scale: OutputScale,
    pub font: FontResource,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            seek_back_frames: DEFAULT_SEEK_BACK_FRAMES,
            apply_delay: DEFAULT_APPLY_DELAY,
            speed_percent: DEFAULT_SPEED_PERCENT,
            graph: GraphOptions::default(),
            default_filters: DEFAULT_FILTERS.iter().map(|n| Some(n.to_string())).collect(),
            default_adjustment: None,
            output_scale: OutputScale::default(),
            font: FontResource::new(None, &std::env::temp_dir()),
        }
    }
}

/// The file currently open.
#[derive(Debug, Clone)]
pub struct MediaSession {
    pub path: PathBuf,
    pub info: MediaInfo,
}

pub struct Player<T: Transport, M: FrameModel> {
    sync: TransportSync<T>,
    model: M,
    reconciler: PositionReconciler,
    chain: FilterChain,
    graph_options: GraphOptions,
    debounce: DebouncedApply,
    session: Option<MediaSession>,
    viewport: (u32, u32),
    output_scale: OutputScale,
    speed_percent: u32,
    font: FontResource,
    default_filters: Vec<Option<String>>,
    graph: String,
    last_state: PlaybackState,
    bus: EventBus,
}

impl<T: Transport, M: FrameModel> Player<T, M> {
    pub fn new(
        transport: T,
        events: Receiver<TransportEvent>,
        model: M,
        bus: EventBus,
        options: PlayerOptions,
    ) -> Self {
        let mut chain = FilterChain::new();
        // Slot 0 shows the plain picture until a file brings its defaults
        let _ = chain.select(SlotId::View(0), "Normal");
        if let Some(name) = options.default_adjustment.as_deref()
            && let Err(e) = chain.select(SlotId::Adjustment, name)
        {
            warn!("Default adjustment: {}", e);
        }

        let step_timeout = options.sync.step_timeout;
        let last_state = transport.state();
        info!("Player initialized ({} layout)", options.graph.layout);
        Self {
            sync: TransportSync::new(transport, events, options.sync),
            model,
            reconciler: PositionReconciler::new(bus.clone(), options.seek_back_frames, step_timeout),
            chain,
            graph_options: options.graph,
            debounce: DebouncedApply::new(options.apply_delay),
            session: None,
            viewport: (0, 0),
            output_scale: options.output_scale,
            speed_percent: options.speed_percent,
            font: options.font,
            default_filters: options.default_filters,
            graph: String::new(),
            last_state,
            bus,
        }
    }

    // === Accessors ===

    pub fn transport(&self) -> &T {
        self.sync.transport()
    }

    pub fn sync(&self) -> &TransportSync<T> {
        &self.sync
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Direct model access. Call [`Player::external_position_changed`] after
    /// moving its frame.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    pub fn graph_options(&self) -> GraphOptions {
        self.graph_options
    }

    pub fn reconciler(&self) -> &PositionReconciler {
        &self.reconciler
    }

    pub fn slider(&self) -> PositionSlider {
        self.reconciler.slider()
    }

    pub fn session(&self) -> Option<&MediaSession> {
        self.session.as_ref()
    }

    pub fn mapper(&self) -> Option<FrameTimeMapper> {
        self.reconciler.mapper()
    }

    /// Last graph installed on the transport.
    pub fn current_graph(&self) -> &str {
        &self.graph
    }

    pub fn speed_percent(&self) -> u32 {
        self.speed_percent
    }

    pub fn is_apply_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    // === Session ===

    /// Open `path`. Re-opening the current file is a no-op.
    ///
    /// Selects the default view filters (other slots and the adjustment are
    /// kept), loads the file and parks the paused transport on the model's
    /// current frame. The filter graph follows through the debounce timer.
    pub fn set_file(&mut self, path: &Path, info: MediaInfo) -> Result<(), PlayerError> {
        if self.session.as_ref().is_some_and(|s| s.path == path) {
            return Ok(());
        }
        info!("Opening {}", path.display());

        let defaults = self.default_filters.clone();
        if let Err(e) = self.chain.select_defaults(&defaults) {
            warn!("Default filters: {}", e);
        }
        self.debounce.schedule();

        self.sync.stop_and_wait_until_stopped()?;
        self.sync.transport_mut().load(path)?;

        let frame_count = if info.frame_count > 0 {
            info.frame_count
        } else {
            self.model.frame_count()
        };
        let duration = self.sync.transport().duration();
        let mapper = FrameTimeMapper::new(frame_count, duration);
        if mapper.is_none() {
            info!("Frame count unknown, navigating by time only");
        }
        self.reconciler.reset(mapper, duration);
        self.session = Some(MediaSession {
            path: path.to_path_buf(),
            info,
        });

        let target = mapper
            .map(|m| m.frame_to_time(self.model.frame_pos() as i64))
            .unwrap_or(0);
        self.sync.play_to_position(target)?;
        // Slider and model follow the landing before anything reads them
        self.pump_events();
        debug!("Opened at {} ms", self.sync.position());
        Ok(())
    }

    pub fn close_file(&mut self) {
        if self.session.take().is_none() {
            return;
        }
        info!("Closing file");
        self.sync.transport_mut().stop();
        self.debounce.cancel();
        self.reconciler.reset(None, 0);
    }

    // === Transport controls ===

    pub fn play_pause(&mut self) {
        self.apply_speed();
        let transport = self.sync.transport_mut();
        if !transport.is_playing() {
            transport.play();
            return;
        }
        let paused = transport.is_paused();
        transport.pause(!paused);
    }

    pub fn set_speed_percent(&mut self, percent: u32) {
        self.speed_percent = percent;
        self.apply_speed();
    }

    fn apply_speed(&mut self) {
        let speed = self.speed_percent as f64 / 100.0;
        self.sync.transport_mut().set_speed(speed);
    }

    /// Seek to 0 and correct a coarse landing with one step.
    pub fn go_to_start(&mut self) -> Result<(), SyncError> {
        debug!("Go to start");
        self.sync.seek_and_wait_until_finished(0)?;
        let position = self.sync.position();
        let timeout = self.sync.config().step_timeout;
        if position > 0 {
            self.sync.step_and_wait_until_finished(StepDirection::Backward, timeout)?;
        } else if position < 0 {
            self.sync.step_and_wait_until_finished(StepDirection::Forward, timeout)?;
        }
        Ok(())
    }

    pub fn go_to_end(&mut self) {
        let transport = self.sync.transport_mut();
        let end = transport.start_position() + transport.duration();
        transport.seek(end);
    }

    pub fn step_next(&mut self) {
        self.sync.transport_mut().step_forward();
    }

    pub fn step_prev(&mut self) {
        self.sync.transport_mut().step_backward();
    }

    /// Seek to operator time entry. Returns the parsed position.
    pub fn go_to_time(&mut self, text: &str) -> i64 {
        let ms = parse_time_ms(text);
        debug!("Go to {} ms ({:?})", ms, text);
        self.sync.transport_mut().seek(ms);
        ms
    }

    // === Position ===

    /// Slider moved by the operator.
    pub fn seek_by_slider(&mut self, value_ms: i64) -> Outcome {
        self.reconciler
            .seek_by_slider(&mut self.sync, &mut self.model, value_ms)
    }

    pub fn set_slider_dragging(&mut self, dragging: bool) {
        self.reconciler.set_slider_dragging(dragging);
    }

    /// Drag ended at `value_ms`.
    pub fn release_slider(&mut self, value_ms: i64) -> Outcome {
        self.reconciler.set_slider_dragging(false);
        self.seek_by_slider(value_ms)
    }

    /// Comments/plot cursor clicked at `frame`.
    pub fn on_cursor_moved(&mut self, frame: usize) -> Outcome {
        self.bus.emit(CursorMovedEvent(frame));
        match self.reconciler.mapper() {
            Some(mapper) => self.seek_by_slider(mapper.frame_to_time(frame as i64)),
            None => Outcome::Ignored,
        }
    }

    /// The model's current frame changed outside the player.
    pub fn external_position_changed(&mut self) -> Result<Outcome, SyncError> {
        self.reconciler
            .on_external_position_changed(&mut self.sync, &self.model)
    }

    /// Move the model to `frame` and follow with the transport.
    pub fn set_frame(&mut self, frame: usize) -> Result<Outcome, SyncError> {
        self.model.set_frame_pos(frame);
        self.external_position_changed()
    }

    /// Handle queued transport notifications. Returns how many were handled.
    pub fn pump_events(&mut self) -> usize {
        let events = self.sync.drain_events();
        let count = events.len();
        for event in events {
            match event {
                TransportEvent::StateChanged(state) => {
                    if state != self.last_state {
                        self.last_state = state;
                        self.bus.emit(PlaybackStateChangedEvent(state));
                    }
                }
                TransportEvent::PositionChanged(_) => {
                    self.reconciler
                        .on_transport_position_changed(&mut self.sync, &mut self.model);
                }
                // completions nobody waited for
                TransportEvent::SeekFinished(_) | TransportEvent::StepFinished => {}
            }
        }
        count
    }

    // === Filters ===

    pub fn select_filter(&mut self, slot: SlotId, name: &str) -> Result<(), ChainError> {
        self.chain.select(slot, name)?;
        self.debounce.schedule();
        Ok(())
    }

    pub fn clear_filter(&mut self, slot: SlotId) -> Result<(), ChainError> {
        self.chain.clear(slot)?;
        self.debounce.schedule();
        Ok(())
    }

    pub fn move_filter(&mut self, from: usize, to: usize) -> Result<(), ChainError> {
        self.chain.move_slot(from, to)?;
        self.debounce.schedule();
        Ok(())
    }

    pub fn set_filter_enabled(&mut self, slot: SlotId, enabled: bool) -> Result<(), ChainError> {
        self.chain.set_enabled(slot, enabled)?;
        self.debounce.schedule();
        Ok(())
    }

    pub fn set_filter_param(&mut self, slot: SlotId, param: &str, value: &str) -> Result<(), ChainError> {
        self.chain.set_param(slot, param, value)?;
        self.debounce.schedule();
        Ok(())
    }

    pub fn set_layout(&mut self, layout: LayoutMode) {
        self.graph_options.layout = layout;
        self.debounce.schedule();
    }

    pub fn set_fit_to_grid(&mut self, fit: bool) {
        self.graph_options.fit_to_grid = fit;
        self.debounce.schedule();
    }

    pub fn set_graph_monitor(&mut self, enabled: bool) {
        self.graph_options.graph_monitor = enabled;
        self.debounce.schedule();
    }

    pub fn output_scale(&self) -> OutputScale {
        self.output_scale
    }

    /// Size `${window_width}`/`${window_height}` resolve to.
    pub fn output_size(&self) -> (u32, u32) {
        let frame = self
            .session
            .as_ref()
            .map(|s| (s.info.width, s.info.height))
            .unwrap_or((0, 0));
        self.output_scale.output_size(frame, self.viewport)
    }

    /// Area available to the picture changed.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if self.viewport == (width, height) {
            return;
        }
        self.viewport = (width, height);
        self.reapply_for_window();
    }

    pub fn set_output_scale(&mut self, scale: OutputScale) {
        if self.output_scale == scale {
            return;
        }
        self.output_scale = scale;
        self.reapply_for_window();
    }

    /// Reapply only when a filter depends on the output size.
    fn reapply_for_window(&mut self) {
        let uses_window = self
            .chain
            .view_expressions()
            .iter()
            .chain(std::iter::once(&self.chain.adjustment_expression()))
            .any(|e| e.contains("${window_"));
        if uses_window {
            self.debounce.schedule();
        }
    }

    /// Fire a due filter reapplication. Returns whether one ran.
    pub fn tick(&mut self) -> Result<bool, PlayerError> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Result<bool, PlayerError> {
        if !self.debounce.tick_at(now) {
            return Ok(false);
        }
        self.apply_filters()?;
        Ok(true)
    }

    fn token_context(&self) -> TokenContext {
        let (width, height, dar) = self
            .session
            .as_ref()
            .map(|s| (s.info.width, s.info.height, s.info.dar))
            .unwrap_or((0, 0, 1.0));
        let (window_width, window_height) = self.output_size();
        TokenContext {
            width,
            height,
            dar,
            window_width,
            window_height,
            fontfile: self.font.token_value(),
        }
    }

    /// Compose the current graph without installing it.
    pub fn compose_graph(&self) -> String {
        compose(
            &self.chain.view_expressions(),
            &self.chain.adjustment_expression(),
            &self.graph_options,
            &self.token_context(),
        )
    }

    /// Rebuild and install the graph now. A paused session is reloaded and
    /// parked back on the slider position.
    pub fn apply_filters(&mut self) -> Result<(), PlayerError> {
        self.debounce.cancel();
        let graph = self.compose_graph();
        info!("Applying filter graph: {}", graph);
        self.sync.transport_mut().set_filter_graph(&graph);
        self.graph = graph.clone();
        self.bus.emit(FilterGraphAppliedEvent { graph });

        if !self.sync.transport().is_paused() {
            return Ok(());
        }
        let Some(path) = self.session.as_ref().map(|s| s.path.clone()) else {
            return Ok(());
        };
        let position = self.reconciler.slider().value;
        debug!("Reloading paused session at {} ms", position);
        self.sync.stop_and_wait_until_stopped()?;
        self.sync.transport_mut().load(&path)?;
        self.sync.play_to_position(position)?;
        self.pump_events();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::downcast_event;
    use crate::core::frame_model::StatsTimeline;
    use crate::core::player_events::PlaybackEndedEvent;
    use crate::core::sim_transport::SimTransport;

    fn player(gop: usize) -> (Player<SimTransport, StatsTimeline>, EventBus) {
        let (sim, rx) = SimTransport::new(100, 10_000);
        let bus = EventBus::new();
        let options = PlayerOptions {
            sync: SyncConfig {
                step_timeout: Duration::from_millis(20),
                wait_timeout: None,
            },
            ..Default::default()
        };
        let player = Player::new(sim.with_gop(gop), rx, StatsTimeline::new(100), bus.clone(), options);
        (player, bus)
    }

    fn open(player: &mut Player<SimTransport, StatsTimeline>) {
        player
            .set_file(Path::new("clip.mkv"), MediaInfo::new(100, 10_000, 720, 480, 1.5))
            .unwrap();
    }

    #[test]
    fn test_set_file_parks_paused_with_defaults() {
        let (mut player, _bus) = player(1);
        player.model_mut().set_frame_pos(30);
        open(&mut player);

        assert_eq!(player.sync().state(), PlaybackState::Paused);
        assert_eq!(player.sync().position(), 3000);
        assert_eq!(player.chain().view_expressions().len(), 4);
        assert!(player.is_apply_pending());

        // same file again: nothing happens
        open(&mut player);
        assert_eq!(player.transport().load_count(), 1);
    }

    #[test]
    fn test_edit_burst_applies_once_and_keeps_position() {
        let (mut player, bus) = player(1);
        open(&mut player);
        player.set_frame(50).unwrap();
        player.pump_events();
        assert_eq!(player.slider().value, 5000);

        player.set_layout(LayoutMode::Vertical);
        player.select_filter(SlotId::View(4), "Histogram").unwrap();
        player.set_fit_to_grid(true);
        player.clear_filter(SlotId::View(4)).unwrap();
        player.set_graph_monitor(false);

        assert!(!player.tick_at(Instant::now()).unwrap());
        let later = Instant::now() + DEFAULT_APPLY_DELAY;
        assert!(player.tick_at(later).unwrap());
        assert!(!player.tick_at(later + DEFAULT_APPLY_DELAY).unwrap());

        assert_eq!(player.transport().graph_installs(), 1);
        assert_eq!(player.transport().load_count(), 2);
        assert_eq!(player.sync().position(), 5000);
        assert!(player.current_graph().contains("inputs=4:layout=0_0|0_h0|0_h0+h1|0_h0+h1+h2"));
        assert!(player.current_graph().contains(",scale=720:480[y1];"));

        let applied = bus
            .poll()
            .iter()
            .filter(|e| downcast_event::<FilterGraphAppliedEvent>(e).is_some())
            .count();
        assert_eq!(applied, 1);

        // the re-announced landing keeps the model in place
        player.pump_events();
        assert_eq!(player.model().frame_pos(), 50);
    }

    #[test]
    fn test_apply_while_playing_does_not_reload() {
        let (mut player, _bus) = player(1);
        open(&mut player);
        player.play_pause();
        assert_eq!(player.sync().state(), PlaybackState::Playing);
        player.apply_filters().unwrap();
        assert_eq!(player.transport().load_count(), 1);
        assert_eq!(player.transport().graph_installs(), 1);
    }

    #[test]
    fn test_play_pause_toggles_and_sets_speed() {
        let (mut player, bus) = player(1);
        player.set_speed_percent(50);
        player.play_pause();
        assert_eq!(player.sync().state(), PlaybackState::Playing);
        assert_eq!(player.transport().speed(), 0.5);
        player.play_pause();
        assert_eq!(player.sync().state(), PlaybackState::Paused);
        player.play_pause();
        assert_eq!(player.sync().state(), PlaybackState::Playing);

        player.pump_events();
        let states: Vec<_> = bus
            .poll()
            .iter()
            .filter_map(|e| downcast_event::<PlaybackStateChangedEvent>(e).map(|s| s.0))
            .collect();
        assert_eq!(
            states,
            vec![PlaybackState::Playing, PlaybackState::Paused, PlaybackState::Playing]
        );
    }

    #[test]
    fn test_go_to_start_and_end() {
        let (mut player, _bus) = player(12);
        open(&mut player);
        player.set_frame(40).unwrap();
        player.go_to_start().unwrap();
        assert_eq!(player.sync().position(), 0);

        player.go_to_end();
        assert_eq!(player.transport().current_frame(), 96);
    }

    #[test]
    fn test_go_to_time_and_steps() {
        let (mut player, _bus) = player(1);
        open(&mut player);
        assert_eq!(player.go_to_time("00:02.500"), 2500);
        assert_eq!(player.sync().position(), 2500);
        player.step_next();
        assert_eq!(player.sync().position(), 2600);
        player.step_prev();
        player.step_prev();
        assert_eq!(player.sync().position(), 2400);

        player.pump_events();
        assert_eq!(player.model().frame_pos(), 24);
    }

    #[test]
    fn test_slider_seek_updates_model_without_echo() {
        let (mut player, _bus) = player(1);
        open(&mut player);
        let seeks = player.transport().seek_count();

        assert_eq!(player.seek_by_slider(7000), Outcome::Applied);
        assert_eq!(player.model().frame_pos(), 70);
        // exactly the slider seek, no reconciliation seek
        assert_eq!(player.transport().seek_count(), seeks + 1);
    }

    #[test]
    fn test_cursor_click_seeks() {
        let (mut player, bus) = player(1);
        open(&mut player);
        assert_eq!(player.on_cursor_moved(12), Outcome::Applied);
        assert_eq!(player.sync().position(), 1200);
        assert!(
            bus.poll()
                .iter()
                .any(|e| downcast_event::<CursorMovedEvent>(e) == Some(&CursorMovedEvent(12)))
        );
    }

    #[test]
    fn test_playback_end_pauses() {
        let (mut player, bus) = player(1);
        open(&mut player);
        player.play_pause();
        player.sync.transport_mut().advance(200);
        player.pump_events();
        assert_eq!(player.sync().state(), PlaybackState::Paused);
        assert!(
            bus.poll()
                .iter()
                .any(|e| downcast_event::<PlaybackEndedEvent>(e).is_some())
        );
    }

    #[test]
    fn test_viewport_resize_reapplies_only_for_window_filters() {
        let (mut player, _bus) = player(1);
        open(&mut player);
        player.apply_filters().unwrap();
        player.set_viewport_size(800, 600);
        assert!(!player.is_apply_pending());

        player.select_filter(SlotId::View(5), "Aspect Fit").unwrap();
        player.apply_filters().unwrap();
        player.set_viewport_size(1024, 768);
        assert!(player.is_apply_pending());
        player.apply_filters().unwrap();
        // fit keeps one pixel free: 1023 wide, 480 * 1023 / 720 high
        assert!(player.current_graph().contains("scale=1023:682:force_original_aspect_ratio=decrease,setdar=1.5"));
    }

    #[test]
    fn test_free_scale_drives_window_tokens() {
        let (mut player, _bus) = player(1);
        open(&mut player);
        player.select_filter(SlotId::View(5), "Aspect Fit").unwrap();
        player.set_viewport_size(1024, 768);
        player.apply_filters().unwrap();

        let mut scale = player.output_scale();
        scale.set_percent(150);
        player.set_output_scale(scale);
        assert!(player.is_apply_pending());
        assert_eq!(player.output_size(), (1080, 720));
        player.apply_filters().unwrap();
        assert!(player.current_graph().contains("scale=1080:720:force_original_aspect_ratio=decrease"));

        // same scale again: nothing to reapply
        player.set_output_scale(scale);
        assert!(!player.is_apply_pending());
    }

    #[test]
    fn test_apply_right_after_open_keeps_frame() {
        let (mut player, _bus) = player(1);
        player.model_mut().set_frame_pos(30);
        open(&mut player);
        assert_eq!(player.slider().value, 3000);

        player.apply_filters().unwrap();
        player.pump_events();
        assert_eq!(player.sync().position(), 3000);
        assert_eq!(player.model().frame_pos(), 30);
        assert_eq!(player.slider().value, 3000);
    }

    #[test]
    fn test_coarse_open_landing_agrees_with_model() {
        // frame 30 snaps to keyframe 24, one step lands on 25
        let (mut player, _bus) = player(12);
        player.model_mut().set_frame_pos(30);
        open(&mut player);
        assert!(player.tick_at(Instant::now() + DEFAULT_APPLY_DELAY).unwrap());
        player.pump_events();

        let mapper = player.mapper().unwrap();
        assert_eq!(player.sync().position(), 2500);
        assert_eq!(player.model().frame_pos(), 25);
        assert_eq!(mapper.frame_to_time(player.model().frame_pos() as i64), player.sync().position());
    }

    #[test]
    fn test_file_switch_keeps_adjustment_and_extra_slots() {
        let (mut player, _bus) = player(1);
        player.select_filter(SlotId::Adjustment, "Adjust Signal").unwrap();
        player.set_filter_param(SlotId::Adjustment, "contrast", "1.5").unwrap();
        open(&mut player);
        player.select_filter(SlotId::View(5), "Histogram").unwrap();

        player
            .set_file(Path::new("other.mkv"), MediaInfo::new(100, 10_000, 720, 480, 1.5))
            .unwrap();
        assert_eq!(player.transport().load_count(), 2);
        assert_eq!(player.chain().adjustment_expression(), "eq=contrast=1.5:brightness=0:saturation=1");
        assert_eq!(player.chain().slots()[5].filter_name(), Some("Histogram"));
        assert_eq!(player.chain().view_expressions().len(), 5);
    }

    #[test]
    fn test_default_adjustment_installed_at_start() {
        let (sim, rx) = SimTransport::new(100, 10_000);
        let options = PlayerOptions {
            default_adjustment: Some("Adjust Signal".to_string()),
            ..Default::default()
        };
        let player = Player::new(sim, rx, StatsTimeline::new(100), EventBus::new(), options);
        assert_eq!(player.chain().adjustment().filter_name(), Some("Adjust Signal"));
    }

    #[test]
    fn test_close_file() {
        let (mut player, _bus) = player(1);
        open(&mut player);
        player.close_file();
        assert!(player.session().is_none());
        assert!(player.mapper().is_none());
        assert!(!player.is_apply_pending());
        assert_eq!(player.sync().state(), PlaybackState::Stopped);
    }
}
