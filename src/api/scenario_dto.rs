use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ScenarioDto {
    pub steps: Vec<ScenarioStepDto>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScenarioStepDto {
    LinkUp(LinkDto),
    LinkDown(LinkDto),
    RequestTunnel(TunnelRequestDto),
    ResizeTunnel(TunnelResizeDto),
    ReleaseTunnel(TunnelReleaseDto),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDto {
    pub src: u64,
    pub dst: u64,
    pub src_port: u16,
    pub dst_port: u16,
    /// Also emit the event for the reverse direction.
    #[serde(default)]
    pub bidirectional: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelRequestDto {
    pub tunnel_id: u16,
    pub src: u64,
    pub dst: u64,
    pub bandwidth: u32,
    pub priority: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelResizeDto {
    pub tunnel_id: u16,
    pub bandwidth: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelReleaseDto {
    pub tunnel_id: u16,
}
