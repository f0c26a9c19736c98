use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use xdrgen_runtime::prelude::{decode, encode, DispatchError, Dispatcher, Error};
use xdrgen_tests::calc::{self, *};

#[derive(Default)]
struct Calc {
    calls: AtomicUsize,
}

fn eval(arg: &Operands) -> calc::Result {
    let value = match arg.kind {
        OP_ADD => arg.values.iter().try_fold(0i64, |acc, v| acc.checked_add(*v)),
        OP_MUL => arg.values.iter().try_fold(1i64, |acc, v| acc.checked_mul(*v)),
        _ => {
            return calc::Result {
                ok: false,
                value: 0,
                reason: format!("unknown operation {}", arg.kind.0),
            }
        }
    };
    match value {
        Some(value) => calc::Result { ok: true, value, reason: String::new() },
        None => calc::Result { ok: false, value: 0, reason: "overflow".to_owned() },
    }
}

impl CalcProgCalcV1Handler for Calc {
    fn calc_null(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn calc_eval(&self, arg: Operands) -> calc::Result {
        self.calls.fetch_add(1, Ordering::SeqCst);
        eval(&arg)
    }
}

impl CalcProgCalcV2Handler for Calc {
    fn calc2_null(&self) {}

    fn calc2_eval(&self, arg: Operands) -> calc::Result {
        eval(&arg)
    }

    fn calc2_negate(&self, arg: i64) -> i64 {
        arg.wrapping_neg()
    }
}

struct Echo;

impl EchoProgEchoV1Handler for Echo {
    fn echo_uint(&self, arg: u32) -> u32 {
        arg
    }
}

fn dispatcher(calc: Arc<Calc>) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(calc_prog_calc_v1_regs(calc.clone())).unwrap();
    dispatcher.register(calc_prog_calc_v2_regs(calc)).unwrap();
    dispatcher.register(echo_prog_echo_v1_regs(Arc::new(Echo))).unwrap();
    dispatcher
}

fn operands(kind: Op, values: &[i64]) -> Vec<u8> {
    encode(&mut Operands { kind, values: values.to_vec() }).unwrap()
}

#[test]
fn ids() {
    assert_eq!(CALC_PROG, 0x20000101);
    assert_eq!((CALC_V1, CALC_V2), (1, 2));
    assert_eq!((CALC_NULL, CALC_EVAL), (0, 1));
    assert_eq!((CALC2_NULL, CALC2_EVAL, CALC2_NEGATE), (0, 1, 2));
    assert_eq!((ECHO_PROG, ECHO_V1, ECHO_UINT), (0x20000102, 1, 1));
}

#[test]
fn one_registration_per_procedure() {
    let calc = Arc::new(Calc::default());
    let regs = calc_prog_calc_v2_regs(calc.clone());
    let keys: Vec<_> = regs.iter().map(|reg| reg.key()).collect();
    assert_eq!(
        keys,
        [
            (CALC_PROG, CALC_V2, CALC2_NULL),
            (CALC_PROG, CALC_V2, CALC2_EVAL),
            (CALC_PROG, CALC_V2, CALC2_NEGATE),
        ],
    );

    let all: HashSet<_> = calc_prog_calc_v1_regs(calc)
        .into_iter()
        .chain(regs)
        .chain(echo_prog_echo_v1_regs(Arc::new(Echo)))
        .map(|reg| reg.key())
        .collect();
    assert_eq!(all.len(), 6);
}

#[test]
fn dispatch_decodes_arguments_and_encodes_results() {
    let dispatcher = dispatcher(Arc::new(Calc::default()));
    assert_eq!(dispatcher.len(), 6);

    let reply = dispatcher
        .dispatch((CALC_PROG, CALC_V1, CALC_EVAL), &operands(OP_ADD, &[1, 2, 3]))
        .unwrap();
    assert_eq!(
        decode::<calc::Result>(&reply),
        Ok(calc::Result { ok: true, value: 6, reason: String::new() }),
    );

    let reply = dispatcher
        .dispatch((CALC_PROG, CALC_V2, CALC2_EVAL), &operands(OP_MUL, &[i64::MAX, 2]))
        .unwrap();
    assert_eq!(
        decode::<calc::Result>(&reply),
        Ok(calc::Result { ok: false, value: 0, reason: "overflow".to_owned() }),
    );

    let reply = dispatcher
        .dispatch((CALC_PROG, CALC_V2, CALC2_NEGATE), &5i64.to_be_bytes())
        .unwrap();
    assert_eq!(reply, (-5i64).to_be_bytes());

    let reply = dispatcher
        .dispatch((ECHO_PROG, ECHO_V1, ECHO_UINT), &[0xde, 0xad, 0xbe, 0xef])
        .unwrap();
    assert_eq!(reply, [0xde, 0xad, 0xbe, 0xef]);
}

#[test]
fn void_procedures() {
    let calc = Arc::new(Calc::default());
    let dispatcher = dispatcher(calc.clone());

    let reply = dispatcher.dispatch((CALC_PROG, CALC_V1, CALC_NULL), &[]).unwrap();
    assert_eq!(reply, Vec::<u8>::new());
    assert_eq!(calc.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn garbage_arguments_never_reach_the_handler() {
    let calc = Arc::new(Calc::default());
    let dispatcher = dispatcher(calc.clone());

    let truncated = dispatcher.dispatch((CALC_PROG, CALC_V1, CALC_EVAL), &[0, 0, 0, 1, 0, 0]);
    assert_eq!(truncated, Err(DispatchError::GarbageArgs(Error::UnexpectedEof)));

    let mut too_many = vec![0, 0, 0, 1, 0, 0, 0, 17];
    too_many.extend(std::iter::repeat(0).take(17 * 8));
    let overflow = dispatcher.dispatch((CALC_PROG, CALC_V1, CALC_EVAL), &too_many);
    assert_eq!(
        overflow,
        Err(DispatchError::GarbageArgs(Error::LengthOverflow { max: 16, got: 17 })),
    );

    assert_eq!(calc.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_procedures_are_rejected() {
    let dispatcher = dispatcher(Arc::new(Calc::default()));

    assert_eq!(
        dispatcher.dispatch((1, 1, 1), &[]),
        Err(DispatchError::ProgUnavail { prog: 1 }),
    );
    assert_eq!(
        dispatcher.dispatch((CALC_PROG, 3, CALC_NULL), &[]),
        Err(DispatchError::ProgMismatch { prog: CALC_PROG, low: 1, high: 2 }),
    );
    assert_eq!(
        dispatcher.dispatch((CALC_PROG, CALC_V1, CALC2_NEGATE), &[]),
        Err(DispatchError::ProcUnavail((CALC_PROG, CALC_V1, CALC2_NEGATE))),
    );
}

#[test]
fn duplicate_registrations_are_rejected() {
    let calc = Arc::new(Calc::default());
    let mut dispatcher = dispatcher(calc.clone());

    assert_eq!(
        dispatcher.register(calc_prog_calc_v1_regs(calc)),
        Err(DispatchError::DuplicateProcedure((CALC_PROG, CALC_V1, CALC_NULL))),
    );
    assert_eq!(dispatcher.len(), 6);
}

#[test]
fn concurrent_dispatch() {
    let calc = Arc::new(Calc::default());
    let dispatcher = dispatcher(calc.clone());

    std::thread::scope(|scope| {
        for thread in 0..4i64 {
            let dispatcher = &dispatcher;
            scope.spawn(move || {
                for i in 0..100 {
                    let args = operands(OP_ADD, &[thread, i]);
                    let reply = dispatcher.dispatch((CALC_PROG, CALC_V1, CALC_EVAL), &args);
                    let result = decode::<calc::Result>(&reply.unwrap()).unwrap();
                    assert_eq!(result.value, thread + i);
                }
            });
        }
    });

    assert_eq!(calc.calls.load(Ordering::SeqCst), 400);
}
