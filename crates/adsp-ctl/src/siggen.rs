use adsp_ipc::wire::{
    Direction, PcmParams, StreamMsg, STREAM_PCM_FREE, STREAM_PCM_PARAMS, STREAM_TRIG_START,
};
use adsp_ipc::IpcChannel;
use tracing::{debug, warn};

use crate::card::CardRuntime;
use crate::error::Result;

/// Toggle the signal-generator pipeline behind a switch control.
///
/// Deactivation marks the virtual front-end inactive and frees the PCM.
/// Activation marks it active, requests a routing re-evaluation so the
/// back-end path comes up, negotiates PCM parameters and starts the
/// stream. Front-end flags set during activation are not rolled back
/// when a later step fails.
pub(crate) fn trigger_pipeline<C: IpcChannel>(
    ipc: &mut C,
    card: &mut dyn CardRuntime,
    comp_id: u32,
    channels: u32,
    link_name: Option<&str>,
    active: bool,
) -> Result<()> {
    if !active {
        set_front_end_active(card, link_name, false);
        send_trigger(ipc, comp_id, STREAM_PCM_FREE)?;
        return Ok(());
    }

    set_front_end_active(card, link_name, true);
    card.request_runtime_update();
    send_pcm_params(ipc, comp_id, channels)?;
    send_trigger(ipc, comp_id, STREAM_TRIG_START)?;
    Ok(())
}

fn set_front_end_active(card: &mut dyn CardRuntime, link_name: Option<&str>, active: bool) {
    let Some(name) = link_name else {
        return;
    };
    match card.front_end_mut(name) {
        Some(fe) => fe.set_active(active),
        None => warn!(link = name, "no front-end registered for siggen control"),
    }
}

fn send_pcm_params<C: IpcChannel>(ipc: &mut C, comp_id: u32, channels: u32) -> Result<()> {
    let params = PcmParams {
        comp_id,
        channels,
        direction: Direction::Playback,
    };
    debug!(comp_id, channels, "negotiating siggen pcm params");

    let mut reply = vec![0u8; PcmParams::reply_len()];
    ipc.send(STREAM_PCM_PARAMS, &params.encode(), &mut reply)?;
    Ok(())
}

fn send_trigger<C: IpcChannel>(ipc: &mut C, comp_id: u32, cmd: u32) -> Result<()> {
    let msg = StreamMsg { comp_id };
    let mut reply = vec![0u8; StreamMsg::reply_len()];
    ipc.send(cmd, &msg.encode(cmd), &mut reply)?;
    Ok(())
}
