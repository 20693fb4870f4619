pub mod request;
pub mod response;

pub use request::{
    GetPromptParams, HelloParams, JsonRpcRequest, ReadResourceParams, RpcId, ToolCallParams,
};
pub use response::{JsonRpcError, JsonRpcResponse, ToolResult, ToolResultContent};
