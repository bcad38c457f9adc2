//! Generator-switch pipeline triggering: front-end bookkeeping, routing
//! re-evaluation and the stream message sequence, in order.

use std::cell::RefCell;
use std::rc::Rc;

use adsp_ctl::{
    Card, CardRuntime, Control, ControlConfig, Dsp, FrontEnd, PowerError, PowerHandle,
    StaticWidgetGraph, WidgetType,
};
use adsp_ipc::wire::{
    ReplyHeader, COMP_SET_VALUE, STREAM_PCM_FREE, STREAM_PCM_PARAMS, STREAM_TRIG_START,
};
use adsp_ipc::{IpcChannel, IpcError};

const SIGGEN_COMP: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    RuntimeUpdate,
    Ipc(u32),
}

type Log = Rc<RefCell<Vec<Event>>>;

struct NullPm;

impl PowerHandle for NullPm {
    fn resume(&mut self) -> Result<(), PowerError> {
        Ok(())
    }
    fn mark_last_busy(&mut self) {}
    fn release_autosuspend(&mut self) -> Result<(), PowerError> {
        Ok(())
    }
    fn release_no_idle(&mut self) {}
}

struct LoggingCard {
    card: Card,
    log: Log,
}

impl CardRuntime for LoggingCard {
    fn front_end_mut(&mut self, link_name: &str) -> Option<&mut FrontEnd> {
        self.card.front_end_mut(link_name)
    }

    fn request_runtime_update(&mut self) {
        self.log.borrow_mut().push(Event::RuntimeUpdate);
    }
}

struct LoggingIpc {
    log: Log,
    requests: Vec<Vec<u8>>,
    fail_on: Option<u32>,
}

impl IpcChannel for LoggingIpc {
    fn send(&mut self, cmd: u32, request: &[u8], reply: &mut [u8]) -> Result<(), IpcError> {
        self.log.borrow_mut().push(Event::Ipc(cmd));
        self.requests.push(request.to_vec());
        if self.fail_on == Some(cmd) {
            return Err(IpcError::Dsp { cmd, status: -22 });
        }
        let mut bytes = Vec::new();
        ReplyHeader {
            size: reply.len() as u32,
            cmd,
            status: 0,
        }
        .encode_into(&mut bytes);
        let n = bytes.len().min(reply.len());
        reply[..n].copy_from_slice(&bytes[..n]);
        Ok(())
    }
}

fn harness(fail_on: Option<u32>) -> (Control, Dsp<LoggingIpc, NullPm>, LoggingCard, StaticWidgetGraph, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let mut graph = StaticWidgetGraph::new();
    graph.insert(SIGGEN_COMP, WidgetType::SigGen);

    let mut card = Card::new();
    card.add_front_end(FrontEnd::new("Tone", true, false));
    let card = LoggingCard {
        card,
        log: log.clone(),
    };

    let control = Control::new(ControlConfig::switch(SIGGEN_COMP, 2).link_name("Tone"));
    let dsp = Dsp::new(
        LoggingIpc {
            log: log.clone(),
            requests: Vec::new(),
            fail_on,
        },
        NullPm,
    );
    (control, dsp, card, graph, log)
}

#[test]
fn activation_pushes_the_value_then_runs_update_params_start() {
    let (mut control, mut dsp, mut card, graph, log) = harness(None);

    assert!(control
        .switch_put(&mut dsp, &graph, &mut card, &[1])
        .unwrap());

    assert_eq!(
        *log.borrow(),
        vec![
            Event::Ipc(COMP_SET_VALUE),
            Event::RuntimeUpdate,
            Event::Ipc(STREAM_PCM_PARAMS),
            Event::Ipc(STREAM_TRIG_START),
        ]
    );

    let fe = card.card.front_end("Tone").unwrap();
    assert!(fe.playback_active);
    assert!(!fe.capture_active);
    assert_eq!(fe.active_streams, 1);

    // PCM params carry the component id and the control's channel count.
    let params = &dsp.ipc_mut().requests[1];
    assert_eq!(
        u32::from_le_bytes(params[8..12].try_into().unwrap()),
        SIGGEN_COMP
    );
    assert_eq!(u32::from_le_bytes(params[12..16].try_into().unwrap()), 2);
}

#[test]
fn deactivation_pushes_the_value_then_frees_the_pcm() {
    let (mut control, mut dsp, mut card, graph, log) = harness(None);

    control
        .switch_put(&mut dsp, &graph, &mut card, &[1])
        .unwrap();
    log.borrow_mut().clear();

    assert!(control
        .switch_put(&mut dsp, &graph, &mut card, &[0])
        .unwrap());

    assert_eq!(
        *log.borrow(),
        vec![Event::Ipc(COMP_SET_VALUE), Event::Ipc(STREAM_PCM_FREE)]
    );
    let fe = card.card.front_end("Tone").unwrap();
    assert!(!fe.playback_active);
    assert_eq!(fe.active_streams, 0);
}

#[test]
fn redundant_generator_put_is_silent() {
    let (mut control, mut dsp, mut card, graph, log) = harness(None);

    control
        .switch_put(&mut dsp, &graph, &mut card, &[1])
        .unwrap();
    log.borrow_mut().clear();

    assert!(!control
        .switch_put(&mut dsp, &graph, &mut card, &[1])
        .unwrap());
    assert!(log.borrow().is_empty());
}

#[test]
fn params_failure_stops_before_the_start_trigger() {
    let (mut control, mut dsp, mut card, graph, log) = harness(Some(STREAM_PCM_PARAMS));

    assert!(control
        .switch_put(&mut dsp, &graph, &mut card, &[1])
        .is_err());

    assert_eq!(
        *log.borrow(),
        vec![
            Event::Ipc(COMP_SET_VALUE),
            Event::RuntimeUpdate,
            Event::Ipc(STREAM_PCM_PARAMS),
        ]
    );
    // Front-end state set on the way in is not rolled back.
    let fe = card.card.front_end("Tone").unwrap();
    assert!(fe.playback_active);
    assert_eq!(fe.active_streams, 1);
}
