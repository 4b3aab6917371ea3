use tinyasm_console::client::RemoteClient;
use tinyasm_console::console::Console;
use tinyasm_console::protocol::Segments;
use tinyasm_console::transport::LocalTransport;
use tinyasm_lang::{Machine, RenderConfig};

const PROGRAM: &str = "\
; add two numbers and copy the result through memory
MOV AX, 10
ADD AX, 5
STORE AX, 0
LOAD BX, 0
";

fn register(console: &Console<LocalTransport>, name: &str) -> i64 {
    console
        .view()
        .registers
        .iter()
        .find(|r| r.name == name)
        .map(|r| r.value)
        .unwrap()
}

#[test]
fn local_and_remote_sessions_agree_on_registers() {
    let mut local: Console<LocalTransport> =
        Console::local(Machine::default(), RenderConfig::local());
    let mut remote = Console::remote(
        RemoteClient::new(LocalTransport::default()),
        Segments::default(),
        RenderConfig::remote(),
    );

    for console in [&mut local, &mut remote] {
        console.editor = PROGRAM.to_string();
        console.load();
        console.run();
    }

    for name in ["AX", "BX", "CX", "DX"] {
        assert_eq!(register(&local, name), register(&remote, name), "{}", name);
    }
    assert_eq!(register(&local, "AX"), 15);
    assert_eq!(local.view().ip, remote.view().ip);
}

#[test]
fn stepping_a_remote_session_to_the_end() {
    let mut console = Console::remote(
        RemoteClient::new(LocalTransport::default()),
        Segments {
            ds: 0x20,
            ..Segments::default()
        },
        RenderConfig::remote(),
    );
    console.editor = PROGRAM.to_string();
    console.load();

    // One comment line and four instructions
    for _ in 0..5 {
        console.step();
    }
    assert_eq!(register(&console, "BX"), 15);
    assert_eq!(register(&console, "DS"), 0x20);

    console.step();
    let last = console.log().last().unwrap();
    assert_eq!(last.to_string(), "end of program");

    console.reset();
    assert_eq!(register(&console, "BX"), 0);
    assert_eq!(console.log()[0].to_string(), "> simulator reset");
}
