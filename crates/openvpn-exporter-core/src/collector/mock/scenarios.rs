//! Pre-built mock filesystem scenarios for testing.
//!
//! File contents come from the golden fixtures under `fixtures/`.

use super::filesystem::MockFs;

pub const CLIENT_STATUS: &str = include_str!("../../../fixtures/client.status");
pub const SERVER_V2_STATUS: &str = include_str!("../../../fixtures/server-v2.status");
pub const SERVER_V3_STATUS: &str = include_str!("../../../fixtures/server-v3.status");
pub const SERVER_V4_STATUS: &str = include_str!("../../../fixtures/server-v4.status");

pub const CLIENT_PATH: &str = "/run/openvpn/client.status";
pub const SERVER_V2_PATH: &str = "/run/openvpn/server2.status";
pub const SERVER_V3_PATH: &str = "/run/openvpn/server3.status";
pub const SERVER_V4_PATH: &str = "/run/openvpn/server4.status";

impl MockFs {
    /// One status file per supported layout, each with a single client.
    pub fn openvpn_fleet() -> Self {
        let mut fs = Self::new();
        fs.add_file(CLIENT_PATH, CLIENT_STATUS);
        fs.add_file(SERVER_V2_PATH, SERVER_V2_STATUS);
        fs.add_file(SERVER_V3_PATH, SERVER_V3_STATUS);
        fs.add_file(SERVER_V4_PATH, SERVER_V4_STATUS);
        fs
    }

    /// A server-v2 status file whose second client row carries a
    /// non-numeric byte counter.
    pub fn corrupted_server() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            SERVER_V2_PATH,
            "\
TITLE,OpenVPN 2.3.10 x86_64-pc-linux-gnu
TIME,Thu Apr 13 15:48:20 2017,1492091300
HEADER,CLIENT_LIST,Common Name,Real Address,Virtual Address,Bytes Received,Bytes Sent,Connected Since,Connected Since (time_t),Username
CLIENT_LIST,alice,203.0.113.10:51234,10.8.0.6,109843,229732,Thu Apr 13 10:12:01 2017,1492071121,UNDEF
CLIENT_LIST,carol,203.0.113.11:40000,10.8.0.7,abc,1,Thu Apr 13 11:00:00 2017,1492081200,UNDEF
END
",
        );
        fs
    }
}
