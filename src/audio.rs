//! Pop sounds using the Web Audio API
//!
//! Procedurally generated, no external files needed.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::driver::SoundPlayer;
use crate::platform::HostError;
use crate::settings::Settings;
use crate::sim::PopKind;

/// Plays the pop effects for the scene
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - pop sounds disabled");
        }
        Self {
            ctx,
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            muted: settings.muted,
        }
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Result<(OscillatorNode, GainNode), HostError> {
        let osc = ctx.create_oscillator().map_err(js_error)?;
        let gain = ctx.create_gain().map_err(js_error)?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).map_err(js_error)?;
        gain.connect_with_audio_node(&ctx.destination())
            .map_err(js_error)?;

        Ok((osc, gain))
    }

    /// Bubble pop - soft bass thump under a bright snap
    fn play_bubble_pop(&self, ctx: &AudioContext, vol: f32) -> Result<(), HostError> {
        let t = ctx.current_time();

        let (osc, gain) = self.create_osc(ctx, 220.0, OscillatorType::Sine)?;
        gain.gain().set_value_at_time(vol * 0.5, t).map_err(js_error)?;
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.18)
            .map_err(js_error)?;
        osc.frequency()
            .exponential_ramp_to_value_at_time(70.0, t + 0.15)
            .map_err(js_error)?;
        osc.start().map_err(js_error)?;
        osc.stop_with_when(t + 0.2).map_err(js_error)?;

        let (snap, snap_gain) = self.create_osc(ctx, 1400.0, OscillatorType::Triangle)?;
        snap_gain
            .gain()
            .set_value_at_time(vol * 0.2, t)
            .map_err(js_error)?;
        snap_gain
            .gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.05)
            .map_err(js_error)?;
        snap.start().map_err(js_error)?;
        snap.stop_with_when(t + 0.06).map_err(js_error)?;
        Ok(())
    }

    /// Mini pop - short rising blip
    fn play_mini_pop(&self, ctx: &AudioContext, vol: f32) -> Result<(), HostError> {
        let (osc, gain) = self.create_osc(ctx, 600.0, OscillatorType::Sine)?;
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).map_err(js_error)?;
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.1)
            .map_err(js_error)?;
        osc.frequency()
            .exponential_ramp_to_value_at_time(1200.0, t + 0.08)
            .map_err(js_error)?;

        osc.start().map_err(js_error)?;
        osc.stop_with_when(t + 0.12).map_err(js_error)?;
        Ok(())
    }
}

impl SoundPlayer for AudioManager {
    fn play(&mut self, kind: PopKind) -> Result<(), HostError> {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return Ok(());
        }
        let Some(ctx) = &self.ctx else {
            return Err(HostError("audio context unavailable".to_string()));
        };

        // Browsers keep the context suspended until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match kind {
            PopKind::Bubble => self.play_bubble_pop(ctx, vol),
            PopKind::Mini => self.play_mini_pop(ctx, vol),
        }
    }
}

fn js_error(e: wasm_bindgen::JsValue) -> HostError {
    HostError(format!("{:?}", e))
}
